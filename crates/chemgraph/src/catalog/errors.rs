use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum CatalogLookupError {
    #[diagnostic(help(
        "symbols are case-sensitive; double-check for typos, or add a new entry to the catalog"
    ))]
    #[error("the symbol {0:?} is neither a known element nor a functional group")]
    UnknownSymbol(String),
}

impl CatalogLookupError {
    pub(crate) fn unknown_symbol(symbol: &str) -> Self {
        Self::UnknownSymbol(symbol.to_owned())
    }
}

//! The closed table of elements and functional groups that CML `elementType` symbols resolve against

mod composition;
mod element;
pub mod errors;

// Standard Library Imports
use std::{collections::hash_map::Entry, ops::Deref, str::FromStr};

// External Crate Imports
use ahash::{HashMap, HashMapExt};
use knuffel::{
    Decode, DecodeScalar,
    ast::{self, Integer, Literal, Radix, TypeName},
    decode::{Context, Kind},
    errors::{DecodeError, ExpectedType},
    span::{Span, Spanned},
    traits::ErrorSpan,
};
use miette::{Diagnostic, LabeledSpan, NamedSource, Result};
use rust_decimal::Decimal;
use thiserror::Error;

// Local Crate Imports
use crate::{Element, ElementOrGroup, FunctionalGroup};
use errors::CatalogLookupError;

/// The catalog bundled with this crate, covering all 118 elements and the common functional group abbreviations
pub const DEFAULT_KDL: &str = include_str!("catalog.kdl");

// Public API ==========================================================================================================

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Catalog {
    elements: HashMap<String, Element>,
    groups: HashMap<String, FunctionalGroup>,
}

impl Catalog {
    pub fn from_kdl(file_name: impl AsRef<str>, text: impl AsRef<str>) -> Result<Self> {
        let parsed_catalog: CatalogKdl = knuffel::parse(file_name.as_ref(), text.as_ref())?;
        parsed_catalog
            .validate(())
            .map_err(|e| e.finalize(file_name, text).into())
    }

    /// Looks `symbol` up as an element first, then as a functional group. Matching is exact and case-sensitive.
    pub fn resolve(&self, symbol: impl AsRef<str>) -> Result<ElementOrGroup<'_>, CatalogLookupError> {
        let symbol = symbol.as_ref();
        self.element(symbol)
            .map(ElementOrGroup::Element)
            .or_else(|| self.functional_group(symbol).map(ElementOrGroup::Group))
            .ok_or_else(|| CatalogLookupError::unknown_symbol(symbol))
    }

    #[must_use]
    pub fn element(&self, symbol: &str) -> Option<&Element> {
        self.elements.get(symbol)
    }

    #[must_use]
    pub fn functional_group(&self, symbol: &str) -> Option<&FunctionalGroup> {
        self.groups.get(symbol)
    }

    #[must_use]
    pub fn elements(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn functional_groups(&self) -> usize {
        self.groups.len()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        // SAFETY: The bundled catalog is checked by the `build_default_catalog` test, so this can never fail
        Self::from_kdl("catalog.kdl", DEFAULT_KDL).unwrap()
    }
}

// KDL File Schema =====================================================================================================

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct CatalogKdl {
    #[knuffel(child, unwrap(children))]
    elements: Vec<ElementKdl>,
    #[knuffel(child, unwrap(children))]
    groups: Vec<GroupKdl>,
}

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct ElementKdl {
    #[knuffel(span)]
    span: Span,
    #[knuffel(node_name)]
    symbol: ElementSymbol,
    #[knuffel(argument)]
    name: String,
    #[knuffel(property(name = "number"))]
    atomic_number: u8,
    #[knuffel(property(name = "weight"))]
    weight: DecimalKdl,
    #[knuffel(property(name = "valency"))]
    valency: Option<u8>,
}

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct GroupKdl {
    #[knuffel(span)]
    span: Span,
    #[knuffel(node_name)]
    symbol: String,
    #[knuffel(argument)]
    name: String,
    #[knuffel(property(name = "composition"))]
    composition: Option<CompositionKdl>,
}

type CompositionKdl = Spanned<String, Span>;

// Lossless Parsing of KDL Numbers to Decimal ==========================================================================

#[derive(Debug, Default)]
struct DecimalKdl(Decimal);

impl<S: ErrorSpan> DecodeScalar<S> for DecimalKdl {
    fn type_check(type_name: &Option<Spanned<TypeName, S>>, ctx: &mut Context<S>) {
        if let Some(t) = type_name {
            ctx.emit_error(DecodeError::TypeName {
                span: t.span().clone(),
                found: Some(t.deref().clone()),
                expected: ExpectedType::no_type(),
                rust_type: "Decimal",
            });
        }
    }

    fn raw_decode(
        value: &Spanned<Literal, S>,
        ctx: &mut Context<S>,
    ) -> Result<Self, DecodeError<S>> {
        match &**value {
            Literal::Decimal(ast::Decimal(s)) | Literal::Int(Integer(Radix::Dec, s)) => {
                let res = if s.contains(['e', 'E']) {
                    Decimal::from_scientific(s)
                } else {
                    Decimal::from_str_exact(s)
                };
                match res {
                    Ok(d) => Ok(Self(d)),
                    Err(e) => {
                        ctx.emit_error(DecodeError::conversion(value, Box::new(e)));
                        Ok(Self::default())
                    }
                }
            }
            unsupported => {
                ctx.emit_error(DecodeError::unsupported(
                    value,
                    format!(
                        "expected a decimal number, found {}",
                        Kind::from(unsupported)
                    ),
                ));
                Ok(Self::default())
            }
        }
    }
}

// Element Symbol Validation ===========================================================================================

#[derive(Debug)]
struct ElementSymbol(String);

impl FromStr for ElementSymbol {
    type Err = InvalidElementSymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_owned();
        let chrs: Vec<_> = s.chars().collect();
        match chrs[..] {
            [f] if f.is_ascii_uppercase() => Ok(Self(s)),
            [f, l] if f.is_ascii_uppercase() && l.is_ascii_lowercase() => Ok(Self(s)),
            _ => Err(InvalidElementSymbolError(s)),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Diagnostic, Error)]
#[error(
    "expected a single uppercase ASCII letter optionally followed by a lowercase ASCII letter, got {0:?}"
)]
struct InvalidElementSymbolError(String);

// Contextual Validation Trait  ========================================================================================

type CatalogResult<T> = Result<T, CatalogErrorKind>;

trait ValidateInto<'c, T> {
    type Context: 'c;

    fn validate(self, ctx: Self::Context) -> CatalogResult<T>;
}

// Catalog Validation ==================================================================================================

impl ValidateInto<'_, Catalog> for CatalogKdl {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> CatalogResult<Catalog> {
        let elements = self.elements.validate(())?;
        let groups = self.groups.validate(&elements)?;
        Ok(Catalog { elements, groups })
    }
}

// Validate Elements ===================================================================================================

type Elements = HashMap<String, Element>;

impl ValidateInto<'_, Elements> for Vec<ElementKdl> {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> CatalogResult<Elements> {
        let mut seen_elements = HashMap::with_capacity(self.len());

        for element in self {
            match seen_elements.entry(element.symbol.0.clone()) {
                Entry::Occupied(e) => {
                    let (symbol, (first_defined_at, _)) = e.remove_entry();
                    return Err(CatalogErrorKind::DuplicateElement(
                        first_defined_at,
                        element.span,
                        symbol,
                    ));
                }
                Entry::Vacant(e) => e.insert((element.span, element.into())),
            };
        }

        Ok(seen_elements
            .into_iter()
            .map(|(k, (_, v))| (k, v))
            .collect())
    }
}

impl From<ElementKdl> for Element {
    fn from(
        ElementKdl {
            symbol,
            name,
            atomic_number,
            weight,
            valency,
            ..
        }: ElementKdl,
    ) -> Self {
        Self {
            symbol: symbol.0,
            name,
            atomic_number,
            atomic_weight: weight.0,
            valency,
        }
    }
}

// Validate Functional Groups ==========================================================================================

type Groups = HashMap<String, FunctionalGroup>;

impl<'e> ValidateInto<'e, Groups> for Vec<GroupKdl> {
    type Context = &'e Elements;

    fn validate(self, ctx: Self::Context) -> CatalogResult<Groups> {
        let mut seen_groups: HashMap<String, (Span, FunctionalGroup)> = HashMap::new();

        for group in self {
            if ctx.contains_key(&group.symbol) {
                return Err(CatalogErrorKind::ShadowedElement(group.span, group.symbol));
            }

            let span = group.span;
            let group = group.validate(ctx)?;
            match seen_groups.entry(group.symbol.clone()) {
                Entry::Occupied(e) => {
                    let (symbol, (first_defined_at, _)) = e.remove_entry();
                    return Err(CatalogErrorKind::DuplicateGroup(
                        first_defined_at,
                        span,
                        symbol,
                    ));
                }
                Entry::Vacant(e) => e.insert((span, group)),
            };
        }

        Ok(seen_groups.into_iter().map(|(k, (_, v))| (k, v)).collect())
    }
}

impl<'e> ValidateInto<'e, FunctionalGroup> for GroupKdl {
    type Context = &'e Elements;

    fn validate(self, ctx: Self::Context) -> CatalogResult<FunctionalGroup> {
        let composition = match self.composition {
            Some(formula) => {
                let span = *formula.span();
                let components = composition::parse(&formula)
                    .ok_or_else(|| CatalogErrorKind::InvalidComposition(span, (*formula).clone()))?;

                for (symbol, _) in &components {
                    if !ctx.contains_key(symbol) {
                        return Err(CatalogErrorKind::UnknownComponent(
                            span,
                            self.symbol,
                            symbol.clone(),
                        ));
                    }
                }
                components
            }
            None => Vec::new(),
        };

        let weight = composition
            .iter()
            .map(|(symbol, count)| ctx[symbol].atomic_weight * Decimal::from(*count))
            .sum();

        Ok(FunctionalGroup {
            symbol: self.symbol,
            name: self.name,
            composition,
            weight,
        })
    }
}

// Validation Error Types and Trait Implementations  ===================================================================

#[derive(Debug, Error)]
#[error("failed to validate element catalog file")]
struct CatalogError {
    kdl: NamedSource<String>,
    #[source]
    kind: CatalogErrorKind,
}

// NOTE: This is manually implemented because the list of labels is dynamic and needs to be extracted from `self.kind`
impl Diagnostic for CatalogError {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.kdl)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(self.kind.labels().into_iter().map(|(s, l)| {
            LabeledSpan::new_with_span(Some(l.to_owned()), *s)
        })))
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        Some(&self.kind)
    }
}

#[derive(Clone, Debug, Diagnostic, Error)]
enum CatalogErrorKind {
    #[error("the element {2:?} has already been defined")]
    #[diagnostic(help("remove the duplicate entry or correct its symbol"))]
    DuplicateElement(Span, Span, String),

    #[error("the functional group {2:?} has already been defined")]
    #[diagnostic(help("remove the duplicate entry or correct its symbol"))]
    DuplicateGroup(Span, Span, String),

    #[error("the functional group {1:?} has the same symbol as an element")]
    #[diagnostic(help("element symbols always win during lookup, so pick a different group symbol"))]
    ShadowedElement(Span, String),

    #[error("the composition {1:?} is not a valid chemical formula")]
    #[diagnostic(help(
        "compositions are element symbols optionally followed by counts, like \"C6H5\""
    ))]
    InvalidComposition(Span, String),

    #[error("the composition of {1:?} contains the unknown element {2:?}")]
    #[diagnostic(help("double-check for typos, or add {2:?} to the elements section"))]
    UnknownComponent(Span, String, String),
}

impl CatalogErrorKind {
    fn labels(&self) -> Vec<(&Span, &'static str)> {
        match self {
            Self::DuplicateElement(s1, s2, _) | Self::DuplicateGroup(s1, s2, _) => {
                vec![(s1, "first defined here"), (s2, "then again here")]
            }
            Self::ShadowedElement(s, _) => vec![(s, "shadows an element")],
            Self::InvalidComposition(s, _) => vec![(s, "invalid composition")],
            Self::UnknownComponent(s, _, _) => vec![(s, "unknown element")],
        }
    }

    fn finalize(self, file_name: impl AsRef<str>, kdl: impl AsRef<str>) -> CatalogError {
        let kdl = NamedSource::new(file_name, kdl.as_ref().to_owned());
        CatalogError { kdl, kind: self }
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use insta::assert_snapshot;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parse_default_catalog() {
        let catalog: CatalogKdl = knuffel::parse("catalog.kdl", DEFAULT_KDL).unwrap();
        assert_eq!(catalog.elements.len(), 118);
        assert_eq!(catalog.groups.len(), 30);
        let carbon = catalog
            .elements
            .iter()
            .find(|e| e.symbol.0 == "C")
            .unwrap();
        assert_eq!(carbon.atomic_number, 6);
        assert_eq!(carbon.weight.0, dec!(12.011));
        assert_eq!(carbon.valency, Some(4));
    }

    #[test]
    fn build_default_catalog() {
        let catalog = Catalog::from_kdl("catalog.kdl", DEFAULT_KDL).unwrap();
        assert_eq!(catalog.elements(), 118);
        assert_eq!(catalog.functional_groups(), 30);
        // Every atomic number appears exactly once
        let mut numbers: Vec<_> = catalog.elements.values().map(|e| e.atomic_number).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=118).collect::<Vec<_>>());
    }

    #[test]
    fn resolve_symbols() {
        let catalog = Catalog::default();

        let carbon = catalog.resolve("C").unwrap();
        assert!(carbon.is_element());
        assert_eq!(carbon.unwrap_element().name(), "Carbon");

        let methyl = catalog.resolve("Me").unwrap();
        assert!(methyl.is_group());
        assert_eq!(methyl.symbol(), "Me");

        let r1 = catalog.resolve("R1").unwrap();
        assert!(r1.is_group());
        assert_eq!(r1.weight(), Decimal::ZERO);

        // Lookups are case-sensitive
        assert!(catalog.resolve("c").is_err());
        assert!(catalog.resolve("ME").is_err());
        // Element symbols always win over functional groups
        assert!(catalog.resolve("Ac").unwrap().is_element());
    }

    #[test]
    fn unknown_symbol_error() {
        let catalog = Catalog::default();
        let error = catalog.resolve("Xx").unwrap_err();
        assert_snapshot!(error.to_string(), @r#"the symbol "Xx" is neither a known element nor a functional group"#);
    }

    #[test]
    fn group_weights() {
        let catalog = Catalog::default();
        let methyl = catalog.functional_group("Me").unwrap();
        assert_eq!(methyl.weight(), dec!(12.011) + dec!(3) * dec!(1.008));
        let carboxyl = catalog.functional_group("CO2H").unwrap();
        assert_eq!(
            carboxyl.composition().collect::<Vec<_>>(),
            vec![("C", 1), ("O", 2), ("H", 1)]
        );
    }

    const ELEMENTS: &str = indoc! {r#"
        elements {
          H "Hydrogen" number=1 weight=1.008 valency=1
          C "Carbon" number=6 weight=12.011 valency=4
        }
    "#};

    fn catalog_with_groups(groups: &str) -> Result<Catalog> {
        Catalog::from_kdl("test", format!("{ELEMENTS}groups {{\n{groups}\n}}\n"))
    }

    #[test]
    fn duplicate_element() {
        let kdl = indoc! {r#"
            elements {
              C "Carbon" number=6 weight=12.011
              C "Carbon" number=6 weight=12.011
            }
            groups {
            }
        "#};
        let error = Catalog::from_kdl("test", kdl).unwrap_err();
        assert_eq!(error.to_string(), "failed to validate element catalog file");
        let kind = error.diagnostic_source().unwrap().to_string();
        assert_eq!(kind, r#"the element "C" has already been defined"#);
    }

    #[test]
    fn duplicate_group() {
        let error = catalog_with_groups(r#"Me "Methyl" composition="CH3"
            Me "Methyl" composition="CH3""#)
        .unwrap_err();
        let kind = error.diagnostic_source().unwrap().to_string();
        assert_eq!(kind, r#"the functional group "Me" has already been defined"#);
    }

    #[test]
    fn shadowed_element() {
        let error = catalog_with_groups(r#"C "Carbon group""#).unwrap_err();
        let kind = error.diagnostic_source().unwrap().to_string();
        assert_eq!(kind, r#"the functional group "C" has the same symbol as an element"#);
    }

    #[test]
    fn invalid_composition() {
        let error = catalog_with_groups(r#"Me "Methyl" composition="ch3""#).unwrap_err();
        let kind = error.diagnostic_source().unwrap().to_string();
        assert_eq!(kind, r#"the composition "ch3" is not a valid chemical formula"#);
    }

    #[test]
    fn unknown_component() {
        let error = catalog_with_groups(r#"OMe "Methoxy" composition="CH3O""#).unwrap_err();
        let kind = error.diagnostic_source().unwrap().to_string();
        assert_eq!(
            kind,
            r#"the composition of "OMe" contains the unknown element "O""#
        );
    }

    #[test]
    fn lowercase_element_symbol() {
        let kdl = indoc! {r#"
            elements {
              c "Carbon" number=6 weight=12.011
            }
            groups {
            }
        "#};
        assert!(Catalog::from_kdl("test", kdl).is_err());
    }

    #[derive(Debug, Decode)]
    struct Lossless(#[knuffel(argument)] DecimalKdl);

    #[test]
    fn decimal_weights() {
        let res = knuffel::parse::<Vec<Lossless>>("test", "lossless 1.00794").unwrap();
        assert_eq!(res[0].0.0, dec!(1.00794));
        let res = knuffel::parse::<Vec<Lossless>>("test", "lossless 98").unwrap();
        assert_eq!(res[0].0.0, dec!(98));
        assert!(knuffel::parse::<Vec<Lossless>>("test", "lossless true").is_err());
    }
}

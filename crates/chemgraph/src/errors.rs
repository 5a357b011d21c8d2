use miette::Diagnostic;
use thiserror::Error;

pub use crate::catalog::errors::CatalogLookupError;

pub type Result<T, E = BondError> = std::result::Result<T, E>;

#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum BondError {
    #[error("an atom cannot be bonded to itself (atom {0:?})")]
    SelfBond(String),

    #[diagnostic(help("only one bond is allowed between any pair of atoms; raise its order instead"))]
    #[error("the atoms {0:?} and {1:?} are already bonded")]
    Duplicate(String, String),

    #[diagnostic(help("atoms must be added to a molecule before they can be bonded"))]
    #[error("the bond endpoint {0:?} is not an atom of this molecule")]
    MissingAtom(String),
}

impl BondError {
    pub(crate) fn self_bond(atom: &str) -> Self {
        Self::SelfBond(atom.to_owned())
    }

    pub(crate) fn duplicate(begin: &str, end: &str) -> Self {
        Self::Duplicate(begin.to_owned(), end.to_owned())
    }

    pub(crate) fn missing_atom(atom: &str) -> Self {
        Self::MissingAtom(atom.to_owned())
    }
}

/// Structural problems that make a `Model` unfit to be written out
#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum ModelError {
    #[diagnostic(help("remove the bond, or add the missing atom back to the molecule"))]
    #[error("the bond {bond:?} in molecule {molecule:?} references an atom that isn't part of that molecule")]
    DanglingBond { molecule: String, bond: String },

    #[diagnostic(help("remove the molecule from the reaction, or add it back to the model"))]
    #[error("the reaction {reaction:?} references a {role} that is not a molecule of this model")]
    MissingParticipant { reaction: String, role: &'static str },
}

impl ModelError {
    pub(crate) fn dangling_bond(molecule: &str, bond: &str) -> Self {
        let molecule = molecule.to_owned();
        let bond = bond.to_owned();

        Self::DanglingBond { molecule, bond }
    }

    pub(crate) fn missing_participant(reaction: &str, role: &'static str) -> Self {
        let reaction = reaction.to_owned();

        Self::MissingParticipant { reaction, role }
    }
}

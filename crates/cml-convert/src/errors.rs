use std::string::FromUtf8Error;

use chemgraph::errors::{BondError, CatalogLookupError, ModelError};
use miette::Diagnostic;
use thiserror::Error;

// NOTE: Import never fails outright: every problem becomes one of these issues, which are rendered to strings and
// stored on the model (or molecule) that they were found in
#[derive(Debug, Diagnostic, Clone, PartialEq, Error)]
pub enum ImportIssue {
    // Fatal Format Problems ===========================================================================================
    #[diagnostic(help("convert the document to CML before importing it"))]
    #[error("unsupported format: the document looks like CDXML, not CML")]
    Cdxml,

    #[error("the document is not well-formed XML: {0}")]
    NotXml(String),

    #[error("the document is not valid UTF-8: {0}")]
    NotUtf8(String),

    #[diagnostic(help("CML documents have a <cml> or <molecule> root, or are wrapped in a Marvin <MDocument>"))]
    #[error("the document's root element <{0}> is not CML")]
    NotCml(String),

    // Errors ==========================================================================================================
    #[error("{error} in {fragment}")]
    UnknownElement {
        error: CatalogLookupError,
        fragment: String,
    },

    #[error("the atom has no elementType in {0}")]
    MissingElement(String),

    #[error("the bond does not reference exactly two atoms in {0}")]
    MalformedBondRefs(String),

    #[error("the bond references the unknown atom {atom:?} in {fragment}")]
    DanglingBondRef { atom: String, fragment: String },

    // Warnings ========================================================================================================
    #[error("{error}; the bond was dropped from {fragment}")]
    RejectedBond { error: BondError, fragment: String },

    #[error("the atom has no 2D coordinates, so it was placed at the origin in {0}")]
    MissingCoordinates(String),

    #[error("the atom id {0:?} is used more than once in this molecule; bonds will refer to its first use")]
    DuplicateAtomId(String),

    #[error("the reaction {reaction:?} references the unknown {role} {molecule:?}")]
    UnresolvedParticipant {
        reaction: String,
        role: &'static str,
        molecule: String,
    },
}

impl ImportIssue {
    /// Warnings mark problems that were repaired or that lose nothing essential; everything else is an error
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::RejectedBond { .. }
                | Self::MissingCoordinates(_)
                | Self::DuplicateAtomId(_)
                | Self::UnresolvedParticipant { .. }
        )
    }

    pub(crate) fn unknown_element(error: CatalogLookupError, fragment: &str) -> Self {
        let fragment = fragment.to_owned();

        Self::UnknownElement { error, fragment }
    }

    pub(crate) fn dangling_bond_ref(atom: &str, fragment: &str) -> Self {
        let atom = atom.to_owned();
        let fragment = fragment.to_owned();

        Self::DanglingBondRef { atom, fragment }
    }

    pub(crate) fn rejected_bond(error: BondError, fragment: &str) -> Self {
        let fragment = fragment.to_owned();

        Self::RejectedBond { error, fragment }
    }

    pub(crate) fn unresolved_participant(reaction: &str, role: &'static str, molecule: &str) -> Self {
        let reaction = reaction.to_owned();
        let molecule = molecule.to_owned();

        Self::UnresolvedParticipant {
            reaction,
            role,
            molecule,
        }
    }
}

#[derive(Debug, Diagnostic, Error)]
pub enum ExportError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidModel(#[from] ModelError),

    #[error("failed to write XML")]
    Write(#[from] std::io::Error),

    #[error("the written XML was not valid UTF-8")]
    Encoding(#[from] FromUtf8Error),
}

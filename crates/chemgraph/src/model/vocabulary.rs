//! The closed sets of tokens that CML uses for bond orders, stereochemistry, placements, and display modes

use std::fmt::{self, Display, Formatter};

use crate::{
    BondOrder, BondPlacement, BondStereo, CompassPoint, ElectronKind, HydrogenLabels, ReactionType,
};

// Bond Orders =========================================================================================================

impl BondOrder {
    /// Never fails: `1/2/3` are normalised to `S/D/T`, and anything outside of the vocabulary is coerced to `"0"`
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        Self::parse(token).unwrap_or_default()
    }

    /// Like `from_token`, but returns `None` for tokens outside of the vocabulary instead of coercing them
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let order = match token.trim() {
            "0" => Self::Other,
            "hbond" => Self::Zero,
            "partial01" | "0.5" => Self::Partial01,
            "1" | "S" | "s" => Self::Single,
            "partial12" => Self::Partial12,
            "A" | "a" | "1.5" => Self::Aromatic,
            "2" | "D" | "d" => Self::Double,
            "partial23" | "2.5" => Self::Partial23,
            "3" | "T" | "t" => Self::Triple,
            _ => return None,
        };
        Some(order)
    }

    /// The canonical token stored in CML
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Other => "0",
            Self::Zero => "hbond",
            Self::Partial01 => "partial01",
            Self::Single => "S",
            Self::Partial12 => "partial12",
            Self::Aromatic => "A",
            Self::Double => "D",
            Self::Partial23 => "partial23",
            Self::Triple => "T",
        }
    }

    /// The underlying numeric order, for conventions that don't understand the symbolic tokens. Aromatic and
    /// `partial12` bonds both become `1.5`, and hydrogen bonds collapse to `0`
    #[must_use]
    pub const fn as_numeric_str(self) -> &'static str {
        match self {
            Self::Other | Self::Zero => "0",
            Self::Partial01 => "0.5",
            Self::Single => "1",
            Self::Partial12 | Self::Aromatic => "1.5",
            Self::Double => "2",
            Self::Partial23 => "2.5",
            Self::Triple => "3",
        }
    }

    /// Bond order in half-bonds, so that aromatic and partial orders stay integral
    #[must_use]
    pub const fn halves(self) -> u32 {
        match self {
            Self::Other | Self::Zero => 0,
            Self::Partial01 => 1,
            Self::Single => 2,
            Self::Partial12 | Self::Aromatic => 3,
            Self::Double => 4,
            Self::Partial23 => 5,
            Self::Triple => 6,
        }
    }
}

impl Display for BondOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Bond Stereochemistry ================================================================================================

impl BondStereo {
    /// Parses the text content of `<bondStereo>` or the local part of its `dictRef` (`cml:W` → `W`)
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        let token = token.rsplit_once(':').map_or(token, |(_, local)| local);
        let stereo = match token {
            "N" => Self::None,
            "W" => Self::Wedge,
            "H" => Self::Hatch,
            "S" => Self::Indeterminate,
            "C" => Self::Cis,
            "T" => Self::Trans,
            _ => return None,
        };
        Some(stereo)
    }

    /// Parses an MDL molfile stereo flag, as used by `convention="MDL"` with a `conventionValue`
    #[must_use]
    pub fn from_mdl(value: &str) -> Option<Self> {
        let stereo = match value.trim() {
            "0" => Self::None,
            "1" => Self::Wedge,
            "4" => Self::Indeterminate,
            "6" => Self::Hatch,
            _ => return None,
        };
        Some(stereo)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "N",
            Self::Wedge => "W",
            Self::Hatch => "H",
            Self::Indeterminate => "S",
            Self::Cis => "C",
            Self::Trans => "T",
        }
    }
}

// Compass Points and Placements =======================================================================================

impl CompassPoint {
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Accepts both abbreviations (`NE`) and full names (`NorthEast`)
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == token || p.full_name() == token)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "N",
            Self::NorthEast => "NE",
            Self::East => "E",
            Self::SouthEast => "SE",
            Self::South => "S",
            Self::SouthWest => "SW",
            Self::West => "W",
            Self::NorthWest => "NW",
        }
    }

    const fn full_name(self) -> &'static str {
        match self {
            Self::North => "North",
            Self::NorthEast => "NorthEast",
            Self::East => "East",
            Self::SouthEast => "SouthEast",
            Self::South => "South",
            Self::SouthWest => "SouthWest",
            Self::West => "West",
            Self::NorthWest => "NorthWest",
        }
    }
}

impl BondPlacement {
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let placement = match token.trim() {
            "Clockwise" => Self::Clockwise,
            "Anticlockwise" => Self::Anticlockwise,
            "Centre" => Self::Centre,
            _ => return None,
        };
        Some(placement)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clockwise => "Clockwise",
            Self::Anticlockwise => "Anticlockwise",
            Self::Centre => "Centre",
        }
    }
}

// Display Modes =======================================================================================================

impl HydrogenLabels {
    /// Also accepts the boolean spellings written by older documents: `true` shows all hydrogens, `false` none
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let labels = match token.trim() {
            "None" | "false" => Self::None,
            "HeteroAndTerminal" => Self::HeteroAndTerminal,
            "All" | "true" => Self::All,
            _ => return None,
        };
        Some(labels)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::HeteroAndTerminal => "HeteroAndTerminal",
            Self::All => "All",
        }
    }
}

impl ElectronKind {
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "LonePair" => Some(Self::LonePair),
            "Radical" => Some(Self::Radical),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LonePair => "LonePair",
            Self::Radical => "Radical",
        }
    }
}

impl ReactionType {
    pub const ALL: [Self; 8] = [
        Self::Normal,
        Self::Reversible,
        Self::ReversibleBiasedForward,
        Self::ReversibleBiasedReverse,
        Self::Blocked,
        Self::Resonance,
        Self::Retrosynthetic,
        Self::Theoretical,
    ];

    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL.into_iter().find(|t| t.as_str() == token)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Reversible => "Reversible",
            Self::ReversibleBiasedForward => "ReversibleBiasedForward",
            Self::ReversibleBiasedReverse => "ReversibleBiasedReverse",
            Self::Blocked => "Blocked",
            Self::Resonance => "Resonance",
            Self::Retrosynthetic => "Retrosynthetic",
            Self::Theoretical => "Theoretical",
        }
    }
}

use std::fmt::{self, Display, Formatter};

use rust_decimal::Decimal;

use crate::{Element, ElementOrGroup, FunctionalGroup};

impl Element {
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn atomic_number(&self) -> u8 {
        self.atomic_number
    }

    #[must_use]
    pub const fn atomic_weight(&self) -> Decimal {
        self.atomic_weight
    }

    /// The default valency used for implicit hydrogen counting, if this element has one
    #[must_use]
    pub const fn valency(&self) -> Option<u8> {
        self.valency
    }
}

impl FunctionalGroup {
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element symbols and their counts, in the order they appear in the catalog's composition formula. Empty for
    /// pseudo-atoms like `R1`
    pub fn composition(&self) -> impl Iterator<Item = (&str, u32)> {
        self.composition.iter().map(|(s, c)| (s.as_str(), *c))
    }

    #[must_use]
    pub const fn weight(&self) -> Decimal {
        self.weight
    }
}

impl ElementOrGroup<'_> {
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Element(e) => e.symbol(),
            Self::Group(g) => g.symbol(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Element(e) => e.name(),
            Self::Group(g) => g.name(),
        }
    }

    #[must_use]
    pub fn weight(&self) -> Decimal {
        match self {
            Self::Element(e) => e.atomic_weight(),
            Self::Group(g) => g.weight(),
        }
    }

    #[must_use]
    pub fn is_carbon(&self) -> bool {
        matches!(self, Self::Element(e) if e.symbol == "C")
    }

    #[must_use]
    pub fn is_hydrogen(&self) -> bool {
        matches!(self, Self::Element(e) if e.symbol == "H")
    }
}

impl Display for ElementOrGroup<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

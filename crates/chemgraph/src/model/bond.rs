use crate::{AtomKey, Bond, BondOrder, BondStereo};

impl Bond {
    pub(crate) const fn new(begin: AtomKey, end: AtomKey) -> Self {
        Self {
            id: String::new(),
            begin,
            end,
            order: BondOrder::Single,
            stereo: BondStereo::None,
            placement: None,
        }
    }

    #[must_use]
    pub const fn begin(&self) -> AtomKey {
        self.begin
    }

    #[must_use]
    pub const fn end(&self) -> AtomKey {
        self.end
    }

    #[must_use]
    pub const fn atoms(&self) -> [AtomKey; 2] {
        [self.begin, self.end]
    }

    /// Compares endpoints as an unordered pair
    #[must_use]
    pub fn connects(&self, a: AtomKey, b: AtomKey) -> bool {
        (self.begin == a && self.end == b) || (self.begin == b && self.end == a)
    }

    /// Given one endpoint, returns the other; `None` if `atom` isn't part of this bond
    #[must_use]
    pub fn partner(&self, atom: AtomKey) -> Option<AtomKey> {
        if atom == self.begin {
            Some(self.end)
        } else if atom == self.end {
            Some(self.begin)
        } else {
            None
        }
    }

    pub(crate) fn rekey(&mut self, begin: AtomKey, end: AtomKey) {
        self.begin = begin;
        self.end = end;
    }
}

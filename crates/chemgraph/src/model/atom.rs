use crate::{Atom, Electron, ElectronKind, ElementOrGroup, Point};

impl<'c> Atom<'c> {
    /// Builds an atom with an empty id, no charge, and no display overrides
    #[must_use]
    pub fn new(element: Option<ElementOrGroup<'c>>, position: Point) -> Self {
        Self {
            id: String::new(),
            element,
            position,
            formal_charge: None,
            isotope_number: None,
            explicit_c: None,
            explicit_h: None,
            explicit_h_placement: None,
            explicit_group_placement: None,
            electrons: Vec::new(),
        }
    }

    /// The catalog symbol of this atom, or `None` if its element couldn't be resolved
    #[must_use]
    pub fn symbol(&self) -> Option<&str> {
        self.element.as_ref().map(ElementOrGroup::symbol)
    }

    /// Clears every display override that only makes sense in the context of neighbouring atoms
    pub(crate) fn clear_display_flags(&mut self) {
        self.explicit_c = None;
        self.explicit_h = None;
        self.explicit_h_placement = None;
        self.explicit_group_placement = None;
    }

    /// Counts the hydrogens this atom carries implicitly, given the summed order of its bonds in half-units (so that
    /// aromatic and partial bonds can be counted exactly)
    #[must_use]
    pub fn implicit_hydrogens(&self, bond_order_halves: u32) -> u32 {
        let Some(ElementOrGroup::Element(element)) = self.element else {
            return 0;
        };
        let Some(valency) = element.valency() else {
            return 0;
        };

        let charge = self.formal_charge.unwrap_or_default();
        // NOTE: Tetravalent atoms and hydrogen lose a hydrogen to either charge, boron gains one as an anion, and the
        // remaining main-group elements gain one per unit of positive charge
        let valency = i64::from(valency);
        let charge = i64::from(charge);
        let available = match element.symbol() {
            "H" => valency - charge.abs(),
            "B" => valency - charge,
            _ if valency == 4 => valency - charge.abs(),
            _ => valency + charge,
        };

        let bonded = i64::from(bond_order_halves.div_ceil(2));
        u32::try_from(available - bonded).unwrap_or_default()
    }
}

impl Electron {
    #[must_use]
    pub fn new(count: u8, kind: ElectronKind) -> Self {
        Self {
            id: String::new(),
            count,
            kind,
            placement: None,
        }
    }
}

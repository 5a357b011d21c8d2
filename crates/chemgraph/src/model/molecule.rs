use std::collections::VecDeque;

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use log::debug;

use crate::{
    Atom, AtomKey, Bond, ElementOrGroup, Molecule, Point,
    errors::{BondError, ModelError, Result},
};

impl<'c> Molecule<'c> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Atoms ===========================================================================================================

    pub fn add_atom(&mut self, element: Option<ElementOrGroup<'c>>, position: Point) -> AtomKey {
        self.insert_atom(Atom::new(element, position))
    }

    pub fn insert_atom(&mut self, atom: Atom<'c>) -> AtomKey {
        let key = AtomKey(self.next_atom);
        self.next_atom += 1;
        self.atoms.insert(key, atom);
        key
    }

    #[must_use]
    pub fn atom(&self, key: AtomKey) -> Option<&Atom<'c>> {
        self.atoms.get(&key)
    }

    pub fn atom_mut(&mut self, key: AtomKey) -> Option<&mut Atom<'c>> {
        self.atoms.get_mut(&key)
    }

    /// Atoms in insertion order
    pub fn atoms(&self) -> impl Iterator<Item = (AtomKey, &Atom<'c>)> {
        self.atoms.iter().map(|(&k, a)| (k, a))
    }

    pub fn atoms_mut(&mut self) -> impl Iterator<Item = (AtomKey, &mut Atom<'c>)> {
        self.atoms.iter_mut().map(|(&k, a)| (k, a))
    }

    /// The number of atoms held directly by this molecule, not counting those of its children
    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Finds the first atom with the display id `id`
    #[must_use]
    pub fn find_atom(&self, id: &str) -> Option<AtomKey> {
        self.atoms
            .iter()
            .find_map(|(&k, a)| (a.id == id).then_some(k))
    }

    /// Removes an atom along with every bond that touches it
    pub fn remove_atom(&mut self, key: AtomKey) -> Option<Atom<'c>> {
        let atom = self.atoms.shift_remove(&key)?;
        self.bonds.retain(|b| !b.atoms().contains(&key));
        Some(atom)
    }

    // Bonds ===========================================================================================================

    /// Bonds `begin` to `end` with a single bond; both atoms must already belong to this molecule, must differ, and
    /// must not already be bonded (in either direction)
    pub fn add_bond(&mut self, begin: AtomKey, end: AtomKey) -> Result<&mut Bond> {
        let display_id = |key: AtomKey| {
            self.atoms
                .get(&key)
                .map(|a| a.id.as_str())
                .ok_or_else(|| BondError::missing_atom(&format!("{key:?}")))
        };
        let begin_id = display_id(begin)?;
        let end_id = display_id(end)?;

        if begin == end {
            return Err(BondError::self_bond(begin_id));
        }
        if self.bond_between(begin, end).is_some() {
            return Err(BondError::duplicate(begin_id, end_id));
        }

        self.bonds.push(Bond::new(begin, end));
        let index = self.bonds.len() - 1;
        Ok(&mut self.bonds[index])
    }

    /// Bonds in insertion order
    #[must_use]
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Endpoints stay fixed, but ids, orders, stereo, and placements can be edited in place
    pub fn bonds_mut(&mut self) -> impl Iterator<Item = &mut Bond> {
        self.bonds.iter_mut()
    }

    #[must_use]
    pub fn bond_between(&self, a: AtomKey, b: AtomKey) -> Option<&Bond> {
        self.bonds.iter().find(|bond| bond.connects(a, b))
    }

    pub fn remove_bond(&mut self, index: usize) -> Option<Bond> {
        (index < self.bonds.len()).then(|| self.bonds.remove(index))
    }

    pub fn neighbours(&self, atom: AtomKey) -> impl Iterator<Item = AtomKey> + '_ {
        self.bonds.iter().filter_map(move |b| b.partner(atom))
    }

    // Child Molecules =================================================================================================

    #[must_use]
    pub fn molecules(&self) -> &[Self] {
        &self.molecules
    }

    pub fn molecules_mut(&mut self) -> &mut [Self] {
        &mut self.molecules
    }

    pub fn add_molecule(&mut self, child: Self) {
        self.molecules.push(child);
    }

    /// The length of `bond`, if both of its endpoints belong to this molecule
    #[must_use]
    pub fn bond_length(&self, bond: &Bond) -> Option<f64> {
        let begin = self.atoms.get(&bond.begin)?.position;
        let end = self.atoms.get(&bond.end)?.position;
        Some((end.x - begin.x).hypot(end.y - begin.y))
    }

    /// Lengths of every bond in this molecule and all of its descendants
    #[must_use]
    pub fn bond_lengths(&self) -> Vec<f64> {
        let mut lengths: Vec<_> = self.bonds.iter().filter_map(|b| self.bond_length(b)).collect();
        lengths.extend(self.molecules.iter().flat_map(Self::bond_lengths));
        lengths
    }

    /// Counts every atom in this molecule and all of its descendants
    #[must_use]
    pub fn total_atom_count(&self) -> usize {
        self.atoms.len()
            + self
                .molecules
                .iter()
                .map(Self::total_atom_count)
                .sum::<usize>()
    }

    /// Every bond in this molecule and all of its descendants
    pub fn all_bonds(&self) -> Box<dyn Iterator<Item = &Bond> + '_> {
        Box::new(
            self.bonds
                .iter()
                .chain(self.molecules.iter().flat_map(Self::all_bonds)),
        )
    }

    // Diagnostics =====================================================================================================

    /// Errors recorded on this molecule and all of its descendants, depth-first
    #[must_use]
    pub fn all_errors(&self) -> Vec<&str> {
        let mut errors: Vec<_> = self.errors.iter().map(String::as_str).collect();
        errors.extend(self.molecules.iter().flat_map(Self::all_errors));
        errors
    }

    #[must_use]
    pub fn all_warnings(&self) -> Vec<&str> {
        let mut warnings: Vec<_> = self.warnings.iter().map(String::as_str).collect();
        warnings.extend(self.molecules.iter().flat_map(Self::all_warnings));
        warnings
    }

    /// Checks that every bond (here and in descendants) joins two atoms of its own molecule
    pub fn validate(&self) -> Result<(), ModelError> {
        if let Some(bond) = self
            .bonds
            .iter()
            .find(|b| b.atoms().iter().any(|k| !self.atoms.contains_key(k)))
        {
            return Err(ModelError::dangling_bond(&self.id, &bond.id));
        }
        self.molecules.iter().try_for_each(Self::validate)
    }

    // Normalisation ===================================================================================================

    /// An isolated atom can't carry display hints that depend on neighbouring bonds, so they're cleared from both the
    /// atom and the molecule holding it
    pub fn normalize_single_atom(&mut self) {
        if self.atoms.len() == 1 {
            if let Some((_, atom)) = self.atoms.first_mut() {
                atom.clear_display_flags();
            }
            self.explicit_c = None;
            self.explicit_h = None;
        }
    }

    /// A molecule holds atoms or child molecules, never both, and each molecule that holds atoms is connected. When a
    /// molecule has both, or its atoms fall into more than one fragment, the atoms are moved into new child molecules
    /// (one per connected component) that are appended after any existing children.
    pub fn split_components(&mut self) {
        if self.atoms.is_empty() {
            return;
        }

        let components = self.components();
        if self.molecules.is_empty() && components.len() < 2 {
            return;
        }
        debug!(
            "splitting {} loose atoms of molecule {:?} into {} child molecule(s)",
            self.atoms.len(),
            self.id,
            components.len()
        );

        let mut atoms = std::mem::take(&mut self.atoms);
        let bonds = std::mem::take(&mut self.bonds);
        let mut new_keys = HashMap::with_capacity(atoms.len());
        let mut children: Vec<Self> = Vec::with_capacity(components.len());

        for component in components {
            let mut child = Self::new();
            for old_key in component {
                if let Some(atom) = atoms.shift_remove(&old_key) {
                    let new_key = child.insert_atom(atom);
                    new_keys.insert(old_key, (children.len(), new_key));
                }
            }
            children.push(child);
        }

        for mut bond in bonds {
            if let (Some(&(child, begin)), Some(&(_, end))) =
                (new_keys.get(&bond.begin), new_keys.get(&bond.end))
            {
                bond.rekey(begin, end);
                children[child].bonds.push(bond);
            }
        }

        for child in &mut children {
            child.normalize_single_atom();
        }
        self.molecules.extend(children);
    }

    /// Groups atoms into connected components, each listed in the order atoms were added
    #[must_use]
    pub fn components(&self) -> Vec<Vec<AtomKey>> {
        let mut adjacency: HashMap<AtomKey, Vec<AtomKey>> = HashMap::with_capacity(self.atoms.len());
        for bond in &self.bonds {
            adjacency.entry(bond.begin).or_default().push(bond.end);
            adjacency.entry(bond.end).or_default().push(bond.begin);
        }

        let order: HashMap<_, _> = self.atoms.keys().enumerate().map(|(i, &k)| (k, i)).collect();
        let mut seen = HashSet::with_capacity(self.atoms.len());
        let mut components = Vec::new();
        for &start in self.atoms.keys() {
            if !seen.insert(start) {
                continue;
            }

            let mut component = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(atom) = queue.pop_front() {
                for &next in adjacency.get(&atom).into_iter().flatten() {
                    if seen.insert(next) {
                        component.push(next);
                        queue.push_back(next);
                    }
                }
            }

            component.sort_by_key(|k| order.get(k).copied());
            components.push(component);
        }
        components
    }
}

#[cfg(test)]
mod tests {
    use crate::{BondOrder, CompassPoint, HydrogenLabels, testing_tools::CATALOG};

    use super::*;

    fn carbon() -> Option<ElementOrGroup<'static>> {
        CATALOG.resolve("C").ok()
    }

    fn labelled(molecule: &mut Molecule<'static>, id: &str) -> AtomKey {
        let key = molecule.add_atom(carbon(), Point::default());
        molecule.atom_mut(key).unwrap().id = id.to_owned();
        key
    }

    #[test]
    fn add_bonds() {
        let mut molecule = Molecule::new();
        let a = labelled(&mut molecule, "a1");
        let b = labelled(&mut molecule, "a2");

        let bond = molecule.add_bond(a, b).unwrap();
        assert_eq!(bond.order, BondOrder::Single);
        bond.order = BondOrder::Double;
        assert_eq!(molecule.bond_between(b, a).unwrap().order, BondOrder::Double);

        // Duplicate bonds are rejected in both directions
        assert_eq!(
            molecule.add_bond(a, b).unwrap_err(),
            BondError::Duplicate("a1".to_owned(), "a2".to_owned())
        );
        assert_eq!(
            molecule.add_bond(b, a).unwrap_err(),
            BondError::Duplicate("a2".to_owned(), "a1".to_owned())
        );
        // So are self-bonds
        assert_eq!(
            molecule.add_bond(a, a).unwrap_err().to_string(),
            r#"an atom cannot be bonded to itself (atom "a1")"#
        );
        assert_eq!(molecule.bonds().len(), 1);
        assert_eq!(molecule.neighbours(a).collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn bonds_to_foreign_atoms() {
        let mut other = Molecule::new();
        let foreign = other.add_atom(carbon(), Point::default());
        let _ = other.add_atom(carbon(), Point::default());
        let foreign_too = other.add_atom(carbon(), Point::default());

        let mut molecule = Molecule::new();
        let a = molecule.add_atom(carbon(), Point::default());
        assert_eq!(foreign, a);
        assert!(matches!(
            molecule.add_bond(a, foreign_too),
            Err(BondError::MissingAtom(_))
        ));
    }

    #[test]
    fn remove_atoms() {
        let mut molecule = Molecule::new();
        let a = labelled(&mut molecule, "a1");
        let b = labelled(&mut molecule, "a2");
        let c = labelled(&mut molecule, "a3");
        molecule.add_bond(a, b).unwrap();
        molecule.add_bond(b, c).unwrap();

        let removed = molecule.remove_atom(b).unwrap();
        assert_eq!(removed.id, "a2");
        assert!(molecule.bonds().is_empty());
        assert_eq!(molecule.find_atom("a3"), Some(c));
        assert_eq!(molecule.find_atom("a2"), None);
        assert!(molecule.remove_atom(b).is_none());
        // Keys are never reused
        let d = molecule.add_atom(carbon(), Point::default());
        assert_ne!(d, b);
    }

    #[test]
    fn single_atom_flags() {
        let mut molecule = Molecule::new();
        let a = molecule.add_atom(carbon(), Point::default());
        molecule.atom_mut(a).unwrap().explicit_c = Some(true);
        molecule.explicit_c = Some(true);
        molecule.explicit_h = Some(HydrogenLabels::All);
        molecule.normalize_single_atom();
        assert_eq!(molecule.atom(a).unwrap().explicit_c, None);
        assert_eq!((molecule.explicit_c, molecule.explicit_h), (None, None));

        // Left alone when there's more than one atom
        let b = molecule.add_atom(carbon(), Point::default());
        molecule.atom_mut(b).unwrap().explicit_c = Some(true);
        molecule.normalize_single_atom();
        assert_eq!(molecule.atom(b).unwrap().explicit_c, Some(true));
    }

    #[test]
    fn components() {
        let mut molecule = Molecule::new();
        let keys: Vec<_> = (0..5)
            .map(|i| labelled(&mut molecule, &format!("a{i}")))
            .collect();
        molecule.add_bond(keys[0], keys[3]).unwrap();
        molecule.add_bond(keys[1], keys[4]).unwrap();
        molecule.add_bond(keys[3], keys[4]).unwrap();

        assert_eq!(
            molecule.components(),
            vec![vec![keys[0], keys[1], keys[3], keys[4]], vec![keys[2]]]
        );
    }

    #[test]
    fn split_mixed_molecules() {
        let mut parent = Molecule::new();
        parent.id = "m1".to_owned();
        let a = labelled(&mut parent, "a1");
        let b = labelled(&mut parent, "a2");
        let lonely = labelled(&mut parent, "a3");
        parent.atom_mut(lonely).unwrap().explicit_h_placement = Some(CompassPoint::East);
        parent.add_bond(a, b).unwrap().order = BondOrder::Triple;

        let mut existing = Molecule::new();
        existing.id = "m2".to_owned();
        parent.add_molecule(existing);

        parent.split_components();
        assert_eq!(parent.atom_count(), 0);
        assert!(parent.bonds().is_empty());
        assert_eq!(parent.total_atom_count(), 3);

        let ids: Vec<Vec<_>> = parent
            .molecules()
            .iter()
            .map(|m| m.atoms().map(|(_, a)| a.id.as_str()).collect())
            .collect();
        assert_eq!(ids, vec![vec![], vec!["a1", "a2"], vec!["a3"]]);

        let pair = &parent.molecules()[1];
        let bond = &pair.bonds()[0];
        assert_eq!(bond.order, BondOrder::Triple);
        assert!(pair.atom(bond.begin()).is_some());
        assert!(pair.atom(bond.end()).is_some());
        assert!(parent.validate().is_ok());

        let single = &parent.molecules()[2];
        assert_eq!(single.atoms().next().unwrap().1.explicit_h_placement, None);
    }

    #[test]
    fn connected_molecules_stay_flat() {
        let mut molecule = Molecule::new();
        let a = labelled(&mut molecule, "a1");
        molecule.split_components();
        assert_eq!(molecule.atom_count(), 1);
        assert!(molecule.molecules().is_empty());

        let b = labelled(&mut molecule, "a2");
        molecule.add_bond(a, b).unwrap();
        molecule.split_components();
        assert_eq!(molecule.atom_count(), 2);
        assert!(molecule.molecules().is_empty());
    }

    #[test]
    fn split_flat_fragments() {
        let mut salt = Molecule::new();
        salt.add_atom(CATALOG.resolve("Na").ok(), Point::default());
        salt.add_atom(CATALOG.resolve("Cl").ok(), Point { x: 20.0, y: 0.0 });

        salt.split_components();
        assert_eq!(salt.atom_count(), 0);
        let children: Vec<_> = salt
            .molecules()
            .iter()
            .map(|m| m.atoms().map(|(_, a)| a.symbol().unwrap_or("?")).collect::<Vec<_>>())
            .collect();
        assert_eq!(children, vec![vec!["Na"], vec!["Cl"]]);
    }

    #[test]
    fn diagnostics() {
        let mut child = Molecule::new();
        child.errors.push("child error".to_owned());
        child.warnings.push("child warning".to_owned());
        let mut parent = Molecule::new();
        parent.errors.push("parent error".to_owned());
        parent.add_molecule(child);

        assert_eq!(parent.all_errors(), vec!["parent error", "child error"]);
        assert_eq!(parent.all_warnings(), vec!["child warning"]);
    }

    #[test]
    fn dangling_bonds() {
        let mut molecule = Molecule::new();
        molecule.id = "m1".to_owned();
        let a = molecule.add_atom(carbon(), Point::default());
        let b = molecule.add_atom(carbon(), Point::default());
        molecule.add_bond(a, b).unwrap().id = "m1.b1".to_owned();
        // Sneak around `remove_atom()` to leave a dangling bond behind
        molecule.atoms.shift_remove(&b);

        assert_eq!(
            molecule.validate().unwrap_err(),
            ModelError::DanglingBond {
                molecule: "m1".to_owned(),
                bond: "m1.b1".to_owned()
            }
        );
    }
}

//! Derived molecule data: formulae, weights, ring membership, and bounding boxes

use std::fmt::Write;

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use itertools::Itertools;
use rust_decimal::Decimal;

use crate::{
    AtomKey, BoundingBox, Catalog, ElementOrGroup, Molecule, MoleculeProperties, Point,
};

impl MoleculeProperties {
    /// The Hill-ordered formula (carbon, then hydrogen, then everything else alphabetically), including implicit
    /// hydrogens and the contents of child molecules
    #[must_use]
    pub fn formula(&self) -> &str {
        &self.formula
    }

    #[must_use]
    pub const fn weight(&self) -> Decimal {
        self.weight
    }

    #[must_use]
    pub fn is_ring_atom(&self, atom: AtomKey) -> bool {
        self.ring_atoms.contains(&atom)
    }

    #[must_use]
    pub fn is_ring_bond(&self, index: usize) -> bool {
        self.ring_bonds.contains(&index)
    }

    #[must_use]
    pub fn ring_atom_count(&self) -> usize {
        self.ring_atoms.len()
    }

    #[must_use]
    pub const fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }
}

impl BoundingBox {
    fn around(point: Point) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    fn include(&mut self, point: Point) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    fn merge(self, other: Self) -> Self {
        let mut merged = self;
        merged.include(other.min);
        merged.include(other.max);
        merged
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

impl Molecule<'_> {
    #[must_use]
    pub const fn properties(&self) -> &MoleculeProperties {
        &self.properties
    }

    /// Recomputes derived properties for this molecule and all of its descendants
    pub fn refresh(&mut self, catalog: &Catalog) {
        for child in &mut self.molecules {
            child.refresh(catalog);
        }

        let mut tally = Tally::default();
        self.tally(catalog, 1, &mut tally);

        let (ring_atoms, ring_bonds) = self.rings();
        let bounds = self
            .atoms
            .values()
            .map(|a| BoundingBox::around(a.position))
            .chain(self.molecules.iter().filter_map(|m| m.properties.bounds))
            .reduce(BoundingBox::merge);

        self.properties = MoleculeProperties {
            formula: hill_formula(&tally.counts),
            weight: tally.weight,
            ring_atoms,
            ring_bonds,
            bounds,
        };
    }

    /// Sums half-bond orders for every atom of this molecule (not its children)
    fn bond_order_halves(&self) -> HashMap<AtomKey, u32> {
        let mut halves = HashMap::with_capacity(self.atoms.len());
        for bond in &self.bonds {
            for atom in bond.atoms() {
                *halves.entry(atom).or_default() += bond.order.halves();
            }
        }
        halves
    }

    fn tally(&self, catalog: &Catalog, multiplier: u64, tally: &mut Tally) {
        let hydrogen = catalog.element("H");
        let halves = self.bond_order_halves();

        for (key, atom) in &self.atoms {
            let implicit = atom.implicit_hydrogens(halves.get(key).copied().unwrap_or_default());
            match atom.element {
                Some(ElementOrGroup::Element(element)) => {
                    tally.add(element.symbol(), multiplier);
                    tally.add_weight(element.atomic_weight(), multiplier);
                }
                Some(ElementOrGroup::Group(group)) => {
                    for (symbol, count) in group.composition() {
                        tally.add(symbol, u64::from(count).saturating_mul(multiplier));
                    }
                    tally.add_weight(group.weight(), multiplier);
                }
                None => (),
            }
            if let (Some(hydrogen), 1..) = (hydrogen, implicit) {
                let count = u64::from(implicit).saturating_mul(multiplier);
                tally.add(hydrogen.symbol(), count);
                tally.add_weight(hydrogen.atomic_weight(), count);
            }
        }

        for child in &self.molecules {
            let multiplier = multiplier.saturating_mul(u64::from(child.count.unwrap_or(1)));
            child.tally(catalog, multiplier, tally);
        }
    }

    /// Finds the bonds that are not bridges (every one of them lies on a cycle) and the atoms they join
    fn rings(&self) -> (HashSet<AtomKey>, HashSet<usize>) {
        let mut finder = BridgeFinder::new(self);
        for &atom in self.atoms.keys() {
            if !finder.discovered.contains_key(&atom) {
                finder.search(atom, None);
            }
        }

        let ring_bonds: HashSet<_> = (0..self.bonds.len())
            .filter(|i| finder.adjacent_to_atoms(*i) && !finder.bridges.contains(i))
            .collect();
        let ring_atoms = ring_bonds
            .iter()
            .flat_map(|&i| self.bonds[i].atoms())
            .collect();
        (ring_atoms, ring_bonds)
    }
}

/// Running element counts and weight of a molecule and its descendants. Nested `count`s multiply, so every sum
/// saturates rather than overflowing
#[derive(Default)]
struct Tally {
    counts: HashMap<String, u64>,
    weight: Decimal,
}

impl Tally {
    fn add(&mut self, symbol: &str, count: u64) {
        let total = self.counts.entry(symbol.to_owned()).or_default();
        *total = total.saturating_add(count);
    }

    fn add_weight(&mut self, weight: Decimal, count: u64) {
        let weight = weight.saturating_mul(Decimal::from(count));
        self.weight = self.weight.saturating_add(weight);
    }
}

struct BridgeFinder<'m> {
    molecule: &'m Molecule<'m>,
    adjacency: HashMap<AtomKey, Vec<(AtomKey, usize)>>,
    discovered: HashMap<AtomKey, usize>,
    lowest: HashMap<AtomKey, usize>,
    bridges: HashSet<usize>,
}

impl<'m> BridgeFinder<'m> {
    fn new(molecule: &'m Molecule<'m>) -> Self {
        let mut adjacency: HashMap<_, Vec<_>> = HashMap::with_capacity(molecule.atoms.len());
        for (index, bond) in molecule.bonds.iter().enumerate() {
            if bond.atoms().iter().all(|k| molecule.atoms.contains_key(k)) {
                adjacency.entry(bond.begin).or_default().push((bond.end, index));
                adjacency.entry(bond.end).or_default().push((bond.begin, index));
            }
        }

        Self {
            molecule,
            adjacency,
            discovered: HashMap::new(),
            lowest: HashMap::new(),
            bridges: HashSet::new(),
        }
    }

    fn adjacent_to_atoms(&self, bond: usize) -> bool {
        self.molecule.bonds[bond]
            .atoms()
            .iter()
            .all(|k| self.molecule.atoms.contains_key(k))
    }

    fn search(&mut self, atom: AtomKey, via: Option<usize>) {
        let time = self.discovered.len();
        self.discovered.insert(atom, time);
        self.lowest.insert(atom, time);

        let neighbours = self.adjacency.get(&atom).cloned().unwrap_or_default();
        for (next, bond) in neighbours {
            if Some(bond) == via {
                continue;
            }
            if let Some(&seen) = self.discovered.get(&next) {
                let low = self.lowest[&atom].min(seen);
                self.lowest.insert(atom, low);
            } else {
                self.search(next, Some(bond));
                let low = self.lowest[&atom].min(self.lowest[&next]);
                self.lowest.insert(atom, low);
                if self.lowest[&next] > self.discovered[&atom] {
                    self.bridges.insert(bond);
                }
            }
        }
    }
}

fn hill_formula(counts: &HashMap<String, u64>) -> String {
    let has_carbon = counts.contains_key("C");
    let rank = |symbol: &str| match symbol {
        "C" if has_carbon => 0,
        "H" if has_carbon => 1,
        _ => 2,
    };

    counts
        .iter()
        .filter(|&(_, &count)| count > 0)
        .sorted_by(|(a, _), (b, _)| rank(a).cmp(&rank(b)).then_with(|| a.cmp(b)))
        .fold(String::new(), |mut formula, (symbol, &count)| {
            if count == 1 {
                formula.push_str(symbol);
            } else {
                // SAFETY: Writing to a `String` never fails
                write!(formula, "{symbol}{count}").unwrap();
            }
            formula
        })
}

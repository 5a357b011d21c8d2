//! Assigns hierarchical display ids (`m1`, `m1.a2`, `m1.a2.e1`, `rs1.r1`, `an3`, …) across a whole `Model`

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use log::debug;

use crate::{Model, Molecule, TextualProperty};

/// Extracts ids from protected labels, which arrive as `id:guid` strings, where everything before the first `:` is the id
pub fn protected_ids<I, S>(labels: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels
        .into_iter()
        .filter_map(|label| {
            let label = label.as_ref();
            let id = label.split_once(':').map_or(label, |(id, _)| id).trim();
            (!id.is_empty()).then(|| id.to_owned())
        })
        .collect()
}

impl Model<'_> {
    /// Gives every entity in the model a globally unique id. Protected ids are never changed, and no generated id ever
    /// collides with one. With `preserve_existing`, every non-empty id is kept (the first occurrence of a duplicate
    /// wins) and gaps are filled with numbers above the largest already in use; otherwise everything that isn't
    /// protected is renumbered from one.
    pub fn relabel(&mut self, preserve_existing: bool, protected_ids: &HashSet<String>) {
        debug!(
            "relabelling model (preserving existing ids: {preserve_existing}, protected ids: {})",
            protected_ids.len()
        );

        let mut labeller = Labeller::new(preserve_existing, protected_ids);
        self.claim_ids(&mut labeller);
        self.assign_ids(&mut labeller);
    }

    /// Fills in missing name, formula, and caption ids without touching anything else, and marks protected properties
    /// as undeletable
    pub fn fill_missing_property_ids(&mut self, protected_ids: &HashSet<String>) {
        let mut labeller = Labeller::new(true, protected_ids);
        for id in self.all_ids() {
            labeller.record(id.to_owned());
        }

        for molecule in self.molecules.values_mut() {
            fill_property_ids(molecule, &mut labeller);
        }
    }

    /// True if any entity anywhere in the model has an empty id
    #[must_use]
    pub fn has_missing_ids(&self) -> bool {
        self.all_ids().iter().any(|id| id.is_empty())
    }

    /// Every id in the model, depth-first and in insertion order, including empty and duplicate ones
    #[must_use]
    pub fn all_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for molecule in self.molecules.values() {
            molecule_ids(molecule, &mut ids);
        }
        for scheme in &self.reaction_schemes {
            ids.push(scheme.id.as_str());
            ids.extend(scheme.reactions.iter().map(|r| r.id.as_str()));
        }
        ids.extend(self.annotations.iter().map(|a| a.id.as_str()));
        ids
    }

    fn claim_ids(&mut self, labeller: &mut Labeller) {
        for molecule in self.molecules.values_mut() {
            claim_molecule(molecule, labeller);
        }
        for scheme in &mut self.reaction_schemes {
            labeller.claim(&mut scheme.id);
            for reaction in &mut scheme.reactions {
                labeller.claim(&mut reaction.id);
            }
        }
        for annotation in &mut self.annotations {
            labeller.claim(&mut annotation.id);
        }
    }

    fn assign_ids(&mut self, labeller: &mut Labeller) {
        for molecule in self.molecules.values_mut() {
            assign_molecule(molecule, labeller);
        }
        for scheme in &mut self.reaction_schemes {
            labeller.assign(&mut scheme.id, "rs");
            let prefix = format!("{}.r", scheme.id);
            for reaction in &mut scheme.reactions {
                labeller.assign(&mut reaction.id, &prefix);
            }
        }
        for annotation in &mut self.annotations {
            labeller.assign(&mut annotation.id, "an");
        }
    }
}

// Labelling Context ===================================================================================================

struct Labeller<'p> {
    preserve_existing: bool,
    protected: &'p HashSet<String>,
    claimed: HashSet<String>,
    highest: HashMap<String, usize>,
    next: HashMap<String, usize>,
}

impl<'p> Labeller<'p> {
    fn new(preserve_existing: bool, protected: &'p HashSet<String>) -> Self {
        Self {
            preserve_existing,
            protected,
            claimed: HashSet::new(),
            highest: HashMap::new(),
            next: HashMap::new(),
        }
    }

    /// Keeps `id` if it's allowed to stay and hasn't been seen yet, otherwise clears it so it's relabelled later
    fn claim(&mut self, id: &mut String) {
        if id.is_empty() {
            return;
        }

        let keep = self.preserve_existing || self.protected.contains(id.as_str());
        if keep && !self.claimed.contains(id.as_str()) {
            self.record(id.clone());
        } else {
            id.clear();
        }
    }

    fn record(&mut self, id: String) {
        if id.is_empty() {
            return;
        }
        if let Some((prefix, number)) = split_number(&id) {
            let highest = self.highest.entry(prefix.to_owned()).or_default();
            *highest = number.max(*highest);
        }
        self.claimed.insert(id);
    }

    fn assign(&mut self, id: &mut String, prefix: &str) {
        if id.is_empty() {
            *id = self.label(prefix);
        }
    }

    fn label(&mut self, prefix: &str) -> String {
        // A suffix that can't be incremented is ignored, and numbering restarts from the bottom
        let start = if self.preserve_existing {
            self.highest.get(prefix).map_or(Some(1), |n| n.checked_add(1)).unwrap_or(1)
        } else {
            1
        };
        let next = self.next.entry(prefix.to_owned()).or_insert(start);

        loop {
            let candidate = format!("{prefix}{next}");
            *next = next.saturating_add(1);
            if !self.protected.contains(&candidate) && !self.claimed.contains(&candidate) {
                self.claimed.insert(candidate.clone());
                return candidate;
            }
        }
    }
}

/// Splits `m1.a12` into `("m1.a", 12)`; `None` if there's no trailing number
fn split_number(id: &str) -> Option<(&str, usize)> {
    let prefix = id.trim_end_matches(|c: char| c.is_ascii_digit());
    let number = id[prefix.len()..].parse().ok()?;
    Some((prefix, number))
}

// Molecule Walks ======================================================================================================

fn properties_mut<'m>(molecule: &'m mut Molecule) -> [(&'m mut Vec<TextualProperty>, &'static str); 3] {
    [
        (&mut molecule.names, "n"),
        (&mut molecule.formulas, "f"),
        (&mut molecule.captions, "l"),
    ]
}

fn claim_molecule(molecule: &mut Molecule, labeller: &mut Labeller) {
    labeller.claim(&mut molecule.id);
    for atom in molecule.atoms.values_mut() {
        labeller.claim(&mut atom.id);
        for electron in &mut atom.electrons {
            labeller.claim(&mut electron.id);
        }
    }
    for bond in &mut molecule.bonds {
        labeller.claim(&mut bond.id);
    }
    for (properties, _) in properties_mut(molecule) {
        for property in properties {
            labeller.claim(&mut property.id);
        }
    }
    for child in &mut molecule.molecules {
        claim_molecule(child, labeller);
    }
}

fn assign_molecule(molecule: &mut Molecule, labeller: &mut Labeller) {
    labeller.assign(&mut molecule.id, "m");

    let atom_prefix = format!("{}.a", molecule.id);
    for atom in molecule.atoms.values_mut() {
        labeller.assign(&mut atom.id, &atom_prefix);
        let electron_prefix = format!("{}.e", atom.id);
        for electron in &mut atom.electrons {
            labeller.assign(&mut electron.id, &electron_prefix);
        }
    }

    let bond_prefix = format!("{}.b", molecule.id);
    for bond in &mut molecule.bonds {
        labeller.assign(&mut bond.id, &bond_prefix);
    }

    fill_property_ids(molecule, labeller);

    for child in &mut molecule.molecules {
        assign_molecule(child, labeller);
    }
}

fn fill_property_ids(molecule: &mut Molecule, labeller: &mut Labeller) {
    let molecule_id = molecule.id.clone();
    for (properties, tag) in properties_mut(molecule) {
        let prefix = format!("{molecule_id}.{tag}");
        for property in properties {
            if labeller.protected.contains(&property.id) {
                property.can_be_deleted = false;
            }
            labeller.assign(&mut property.id, &prefix);
        }
    }
}

fn molecule_ids<'m>(molecule: &'m Molecule, ids: &mut Vec<&'m str>) {
    ids.push(&molecule.id);
    for atom in molecule.atoms.values() {
        ids.push(&atom.id);
        ids.extend(atom.electrons.iter().map(|e| e.id.as_str()));
    }
    ids.extend(molecule.bonds.iter().map(|b| b.id.as_str()));
    for properties in [&molecule.names, &molecule.formulas, &molecule.captions] {
        ids.extend(properties.iter().map(|p| p.id.as_str()));
    }
    for child in &molecule.molecules {
        molecule_ids(child, ids);
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_debug_snapshot;
    use itertools::Itertools;

    use crate::{
        Annotation, Electron, ElectronKind, Point, Reaction, ReactionScheme,
        testing_tools::{CATALOG, ethanol},
    };

    use super::*;

    fn atom_ids(model: &Model) -> Vec<String> {
        let (_, molecule) = model.molecules().next().unwrap();
        molecule.atoms().map(|(_, a)| a.id.clone()).collect()
    }

    fn set_atom_ids(model: &mut Model, ids: &[&str]) {
        let (key, _) = model.molecules().next().unwrap();
        let molecule = model.molecule_mut(key).unwrap();
        for ((_, atom), id) in molecule.atoms_mut().zip(ids) {
            (*id).clone_into(&mut atom.id);
        }
    }

    fn is_unique(model: &Model) -> bool {
        model.all_ids().iter().all_unique()
    }

    #[test]
    fn parse_protected_ids() {
        let ids = protected_ids(["m1.n1:6b2c0e1d-3f8a", "m2.n1", "m1.f1:abc:def", ":orphan", ""]);
        let ids: Vec<_> = ids.into_iter().sorted().collect();
        assert_eq!(ids, vec!["m1.f1", "m1.n1", "m2.n1"]);
    }

    #[test]
    fn label_everything() {
        let mut model = ethanol();
        let (key, _) = model.molecules().next().unwrap();
        let molecule = model.molecule_mut(key).unwrap();
        molecule.names.push(TextualProperty::new(TextualProperty::NAME_TYPE, "ethanol"));
        molecule.formulas.push(TextualProperty::new(TextualProperty::FORMULA_TYPE, "C2H6O"));
        molecule.captions.push(TextualProperty::new(TextualProperty::CAPTION_TYPE, "solvent"));
        let (oxygen, _) = molecule.atoms().last().unwrap();
        let oxygen = molecule.atom_mut(oxygen).unwrap();
        oxygen.electrons.push(Electron::new(2, ElectronKind::LonePair));
        oxygen.electrons.push(Electron::new(2, ElectronKind::LonePair));

        let mut child = Molecule::new();
        child.add_atom(CATALOG.resolve("Na").ok(), Point::default());
        molecule.add_molecule(child);
        model.add_molecule();

        model.reaction_schemes.push(ReactionScheme {
            id: String::new(),
            reactions: vec![Reaction::default(), Reaction::default()],
        });
        model.annotations.push(Annotation::new(Point::default(), "<FlowDocument/>"));

        assert!(model.has_missing_ids());
        model.relabel(false, &HashSet::new());
        assert!(!model.has_missing_ids());

        assert_debug_snapshot!(model.all_ids(), @r#"
        [
            "m1",
            "m1.a1",
            "m1.a2",
            "m1.a3",
            "m1.a3.e1",
            "m1.a3.e2",
            "m1.b1",
            "m1.b2",
            "m1.n1",
            "m1.f1",
            "m1.l1",
            "m2",
            "m2.a1",
            "m3",
            "rs1",
            "rs1.r1",
            "rs1.r2",
            "an1",
        ]
        "#);
    }

    #[test]
    fn renumber_from_scratch() {
        let mut model = ethanol();
        set_atom_ids(&mut model, &["a7", "a3", "a3"]);
        model.relabel(false, &HashSet::new());
        assert_eq!(atom_ids(&model), ["m1.a1", "m1.a2", "m1.a3"]);
    }

    #[test]
    fn preserve_existing() {
        let mut model = ethanol();
        set_atom_ids(&mut model, &["m1.a1", "m1.a5", ""]);
        model.relabel(true, &HashSet::new());
        // Gaps are preserved and new ids start above the largest in use
        assert_eq!(atom_ids(&model), ["m1.a1", "m1.a5", "m1.a6"]);
        assert!(is_unique(&model));
    }

    #[test]
    fn preserve_resolves_duplicates() {
        let mut model = ethanol();
        set_atom_ids(&mut model, &["a1", "a1", "m1.a1"]);
        model.relabel(true, &HashSet::new());
        // The first occurrence wins
        assert_eq!(atom_ids(&model), ["a1", "m1.a2", "m1.a1"]);
        assert!(is_unique(&model));
    }

    #[test]
    fn relabel_is_idempotent() {
        let mut model = ethanol();
        model.relabel(false, &HashSet::new());
        set_atom_ids(&mut model, &["m1.a9", "x", "m1.a2"]);
        let first = model.all_ids().into_iter().map(str::to_owned).collect_vec();
        model.relabel(true, &HashSet::new());
        let second = model.all_ids().into_iter().map(str::to_owned).collect_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn protected_ids_are_stable() {
        let mut model = ethanol();
        set_atom_ids(&mut model, &["x", "m1.a3", ""]);
        let protected = protected_ids(["m1.a3:guid"]);
        model.relabel(false, &protected);
        assert_eq!(atom_ids(&model), ["m1.a1", "m1.a3", "m1.a2"]);

        // Generated ids skip protected ones, even if nothing in the model currently uses them
        let mut model = ethanol();
        let protected = protected_ids(["m1.a1:guid"]);
        model.relabel(false, &protected);
        assert_eq!(atom_ids(&model), ["m1.a2", "m1.a3", "m1.a4"]);
    }

    #[test]
    fn fill_missing_properties() {
        let mut model = ethanol();
        model.relabel(false, &HashSet::new());
        let (key, _) = model.molecules().next().unwrap();
        let molecule = model.molecule_mut(key).unwrap();
        let mut kept = TextualProperty::new(TextualProperty::NAME_TYPE, "ethanol");
        "m1.n1".clone_into(&mut kept.id);
        molecule.names.push(kept);
        molecule.names.push(TextualProperty::new(TextualProperty::NAME_TYPE, "ethyl alcohol"));
        molecule.formulas.push(TextualProperty::new(TextualProperty::FORMULA_TYPE, "C2H6O"));
        // Atom ids aren't touched by this pass
        molecule.atoms_mut().next().unwrap().1.id.clear();

        model.fill_missing_property_ids(&protected_ids(["m1.n1:guid"]));
        let (_, molecule) = model.molecules().next().unwrap();
        let names: Vec<_> = molecule
            .names
            .iter()
            .map(|n| (n.id.as_str(), n.can_be_deleted))
            .collect();
        assert_eq!(names, vec![("m1.n1", false), ("m1.n2", true)]);
        assert_eq!(molecule.formulas[0].id, "m1.f1");
        assert_eq!(atom_ids(&model), ["", "m1.a2", "m1.a3"]);
    }

    #[test]
    fn saturated_suffixes() {
        let mut model = ethanol();
        let (key, _) = model.molecules().next().unwrap();
        let huge = format!("m{}", usize::MAX);
        huge.clone_into(&mut model.molecule_mut(key).unwrap().id);
        let second = model.add_molecule();
        set_atom_ids(&mut model, &[format!("{huge}.a{}", usize::MAX).as_str(), "", ""]);

        model.relabel(true, &protected_ids(["m1.n1:guid"]));
        assert_eq!(model.molecule(second).unwrap().id, "m1");
        assert_eq!(
            atom_ids(&model)[1..],
            [format!("{huge}.a1"), format!("{huge}.a2")]
        );
        assert!(is_unique(&model));
    }

    #[test]
    fn split_number_suffixes() {
        assert_eq!(split_number("m1.a12"), Some(("m1.a", 12)));
        assert_eq!(split_number("rs3"), Some(("rs", 3)));
        assert_eq!(split_number("m1.a"), None);
        assert_eq!(split_number("42"), Some(("", 42)));
    }
}

use crate::{
    Annotation, Catalog, DisplayFlags, HydrogenLabels, Model, Molecule, MoleculeKey, Point, Reaction,
    TextualProperty, errors::ModelError,
};

impl<'c> Model<'c> {
    #[must_use]
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            next_molecule: 0,
            molecules: Default::default(),
            reaction_schemes: Vec::new(),
            annotations: Vec::new(),
            flags: DisplayFlags::default(),
            custom_xml_part_guid: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    // Molecules =======================================================================================================

    /// Adds a new, empty top-level molecule
    pub fn add_molecule(&mut self) -> MoleculeKey {
        self.insert_molecule(Molecule::new())
    }

    pub fn insert_molecule(&mut self, molecule: Molecule<'c>) -> MoleculeKey {
        let key = MoleculeKey(self.next_molecule);
        self.next_molecule += 1;
        self.molecules.insert(key, molecule);
        key
    }

    #[must_use]
    pub fn molecule(&self, key: MoleculeKey) -> Option<&Molecule<'c>> {
        self.molecules.get(&key)
    }

    pub fn molecule_mut(&mut self, key: MoleculeKey) -> Option<&mut Molecule<'c>> {
        self.molecules.get_mut(&key)
    }

    /// Top-level molecules in insertion order
    pub fn molecules(&self) -> impl Iterator<Item = (MoleculeKey, &Molecule<'c>)> {
        self.molecules.iter().map(|(&k, m)| (k, m))
    }

    pub fn molecules_mut(&mut self) -> impl Iterator<Item = (MoleculeKey, &mut Molecule<'c>)> {
        self.molecules.iter_mut().map(|(&k, m)| (k, m))
    }

    #[must_use]
    pub fn molecule_count(&self) -> usize {
        self.molecules.len()
    }

    /// Finds the first top-level molecule with the display id `id`
    #[must_use]
    pub fn find_molecule(&self, id: &str) -> Option<MoleculeKey> {
        self.molecules
            .iter()
            .find_map(|(&k, m)| (m.id == id).then_some(k))
    }

    /// Removes a top-level molecule. Reactions that refer to it are left untouched, so they'll fail validation until
    /// they're fixed or removed too
    pub fn remove_molecule(&mut self, key: MoleculeKey) -> Option<Molecule<'c>> {
        self.molecules.shift_remove(&key)
    }

    /// Every reaction of every scheme, in order
    pub fn reactions(&self) -> impl Iterator<Item = &Reaction> {
        self.reaction_schemes.iter().flat_map(|s| &s.reactions)
    }

    // Diagnostics =====================================================================================================

    /// Model-level errors followed by those of every molecule, depth-first
    #[must_use]
    pub fn all_errors(&self) -> Vec<&str> {
        let mut errors: Vec<_> = self.errors.iter().map(String::as_str).collect();
        errors.extend(self.molecules.values().flat_map(Molecule::all_errors));
        errors
    }

    #[must_use]
    pub fn all_warnings(&self) -> Vec<&str> {
        let mut warnings: Vec<_> = self.warnings.iter().map(String::as_str).collect();
        warnings.extend(self.molecules.values().flat_map(Molecule::all_warnings));
        warnings
    }

    /// Checks that every bond joins atoms of its own molecule and that every reaction participant is a molecule of
    /// this model
    pub fn validate(&self) -> Result<(), ModelError> {
        self.molecules.values().try_for_each(Molecule::validate)?;

        for reaction in self.reactions() {
            for (role, participants) in [
                ("reactant", &reaction.reactants),
                ("product", &reaction.products),
            ] {
                if participants.iter().any(|k| !self.molecules.contains_key(k)) {
                    return Err(ModelError::missing_participant(&reaction.id, role));
                }
            }
        }
        Ok(())
    }

    // Derived Properties ==============================================================================================

    pub fn refresh(&mut self) {
        let catalog = self.catalog;
        for molecule in self.molecules.values_mut() {
            molecule.refresh(catalog);
        }
    }

    /// The mean length of every bond in the model, or `None` if there are no bonds
    #[must_use]
    pub fn mean_bond_length(&self) -> Option<f64> {
        let lengths: Vec<_> = self
            .molecules
            .values()
            .flat_map(Molecule::bond_lengths)
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let count = lengths.len() as f64;
        (!lengths.is_empty()).then(|| lengths.iter().sum::<f64>() / count)
    }
}

impl Default for DisplayFlags {
    fn default() -> Self {
        Self {
            explicit_c: false,
            explicit_h: HydrogenLabels::HeteroAndTerminal,
            show_coloured_atoms: true,
            show_grouping: true,
            show_molecular_weight: false,
            show_captions: false,
        }
    }
}

impl Annotation {
    /// Builds an editable annotation with an empty id; its symbol size is left at zero until a model backfills it
    #[must_use]
    pub fn new(position: Point, xaml: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            position,
            symbol_size: 0.0,
            is_editable: true,
            xaml: xaml.into(),
        }
    }
}

impl TextualProperty {
    pub const NAME_TYPE: &'static str = "chem4word:Synonym";
    pub const FORMULA_TYPE: &'static str = "chem4word:Formula";
    pub const CAPTION_TYPE: &'static str = "chem4word:Caption";

    /// Builds a deletable property with an empty id
    #[must_use]
    pub fn new(full_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            full_type: full_type.into(),
            value: value.into(),
            can_be_deleted: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexSet;

    use crate::{
        ReactionScheme,
        testing_tools::{CATALOG, ethanol},
    };

    use super::*;

    #[test]
    fn default_flags() {
        let model = Model::new(&CATALOG);
        assert_eq!(
            model.flags,
            DisplayFlags {
                explicit_c: false,
                explicit_h: HydrogenLabels::HeteroAndTerminal,
                show_coloured_atoms: true,
                show_grouping: true,
                show_molecular_weight: false,
                show_captions: false,
            }
        );
        assert_eq!(model.molecule_count(), 0);
        assert!(model.all_errors().is_empty());
        assert_eq!(model.mean_bond_length(), None);
    }

    #[test]
    fn molecule_keys() {
        let mut model = Model::new(&CATALOG);
        let first = model.add_molecule();
        let second = model.add_molecule();
        model.molecule_mut(second).unwrap().id = "m2".to_owned();

        assert_ne!(first, second);
        assert_eq!(model.find_molecule("m2"), Some(second));
        assert_eq!(model.find_molecule("m3"), None);

        assert!(model.remove_molecule(first).is_some());
        let third = model.add_molecule();
        // Keys are never reused
        assert_ne!(third, first);
        let order: Vec<_> = model.molecules().map(|(k, _)| k).collect();
        assert_eq!(order, vec![second, third]);
    }

    #[test]
    fn diagnostics() {
        let mut model = Model::new(&CATALOG);
        model.errors.push("model error".to_owned());
        let key = model.add_molecule();
        let molecule = model.molecule_mut(key).unwrap();
        molecule.errors.push("molecule error".to_owned());
        molecule.warnings.push("molecule warning".to_owned());

        assert_eq!(model.all_errors(), vec!["model error", "molecule error"]);
        assert_eq!(model.all_warnings(), vec!["molecule warning"]);
    }

    #[test]
    fn missing_participants() {
        let mut model = ethanol();
        let (ethanol, _) = model.molecules().next().unwrap();
        let reaction = Reaction {
            id: "rs1.r1".to_owned(),
            reactants: IndexSet::from([ethanol]),
            ..Reaction::default()
        };
        model.reaction_schemes.push(ReactionScheme {
            id: "rs1".to_owned(),
            reactions: vec![reaction],
        });
        assert!(model.validate().is_ok());

        model.remove_molecule(ethanol);
        assert_eq!(
            model.validate().unwrap_err().to_string(),
            r#"the reaction "rs1.r1" references a reactant that is not a molecule of this model"#
        );
    }

    #[test]
    fn mean_bond_length() {
        let model = ethanol();
        let mean = model.mean_bond_length().unwrap();
        // One bond of 20 and one of ~20 (10, 17.32)
        assert!((mean - 20.0).abs() < 0.01);
    }

    #[test]
    fn new_annotation() {
        let annotation = Annotation::new(Point { x: 1.0, y: 2.0 }, "<FlowDocument/>");
        assert!(annotation.is_editable);
        assert!(annotation.id.is_empty());
        assert_eq!(annotation.xaml, "<FlowDocument/>");
    }
}

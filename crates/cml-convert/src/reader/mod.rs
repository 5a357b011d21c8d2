//! CML → `Model`: a tag-dispatching reader that never fails, recording every problem it finds as a diagnostic

mod molecule;
mod reaction;

use ahash::HashSet;
use chemgraph::{Catalog, HydrogenLabels, Model, Molecule, protected_ids};
use log::{debug, warn};
use roxmltree::{Document, Node};

use crate::{
    errors::ImportIssue,
    xml::{child_named, children_named, is_named, parse_bool, text},
};

const DEFAULT_BOND_LENGTH: f64 = 20.0;
const SYMBOL_SIZE_STEP: f64 = 5.0;

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ImportOptions {
    /// Labels (`id:guid`) of textual properties that a host document links to. Their ids must never change
    pub protected_labels: Vec<String>,
    /// Renumber every id from scratch; ignored when any labels are protected
    pub relabel: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            protected_labels: Vec::new(),
            relabel: true,
        }
    }
}

/// Imports CML text into a `Model`. This never fails: a document that isn't CML at all produces an empty model with a
/// single error, and everything else is recorded as errors or warnings on the model and its molecules.
pub fn import<'c>(catalog: &'c Catalog, raw: &str, options: &ImportOptions) -> Model<'c> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut model = Model::new(catalog);

    if raw.contains("<CDXML") {
        model.record(ImportIssue::Cdxml);
        return model;
    }
    let document = match Document::parse(raw) {
        Ok(document) => document,
        Err(error) => {
            model.record(ImportIssue::NotXml(error.to_string()));
            return model;
        }
    };

    let root = document.root_element();
    let marvin = is_marvin(root);
    if !marvin && !is_named(&root, "cml") && !is_named(&root, "molecule") {
        model.record(ImportIssue::NotCml(root.tag_name().name().to_owned()));
        return model;
    }

    read_flags(&mut model, root);
    for node in molecule_nodes(root, marvin) {
        let molecule = molecule::read_molecule(catalog, raw, node);
        model.insert_molecule(molecule);
    }
    reaction::read_reaction_schemes(&mut model, raw, root);
    reaction::read_annotations(&mut model, raw, root);

    assign_labels(&mut model, options);
    backfill_symbol_sizes(&mut model);
    model.refresh();

    debug!(
        "imported {} molecule(s) with {} error(s) and {} warning(s)",
        model.molecule_count(),
        model.all_errors().len(),
        model.all_warnings().len()
    );
    model
}

/// Like `import()`, but for a raw byte buffer that should hold UTF-8 (with or without a byte-order mark)
pub fn import_bytes<'c>(catalog: &'c Catalog, raw: &[u8], options: &ImportOptions) -> Model<'c> {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    match std::str::from_utf8(raw) {
        Ok(text) => import(catalog, text, options),
        Err(error) => {
            let mut model = Model::new(catalog);
            model.record(ImportIssue::NotUtf8(error.to_string()));
            model
        }
    }
}

// Diagnostics =========================================================================================================

/// Anything that keeps lists of errors and warnings
pub(crate) trait RecordIssue {
    fn issues(&mut self) -> (&mut Vec<String>, &mut Vec<String>);

    fn record(&mut self, issue: ImportIssue) {
        warn!("{issue}");
        let (errors, warnings) = self.issues();
        if issue.is_warning() {
            warnings.push(issue.to_string());
        } else {
            errors.push(issue.to_string());
        }
    }
}

impl RecordIssue for Model<'_> {
    fn issues(&mut self) -> (&mut Vec<String>, &mut Vec<String>) {
        (&mut self.errors, &mut self.warnings)
    }
}

impl RecordIssue for Molecule<'_> {
    fn issues(&mut self) -> (&mut Vec<String>, &mut Vec<String>) {
        (&mut self.errors, &mut self.warnings)
    }
}

// Pipeline Steps ======================================================================================================

fn is_marvin(root: Node) -> bool {
    let chemaxon_namespace = root
        .namespaces()
        .any(|ns| ns.uri().contains("chemaxon"))
        || root.tag_name().namespace().is_some_and(|ns| ns.contains("chemaxon"));
    let marvin = chemaxon_namespace
        || is_named(&root, "MDocument")
        || child_named(root, "MDocument").is_some();

    if marvin {
        debug!("detected a ChemAxon Marvin document");
    }
    marvin
}

fn molecule_nodes<'a, 'i>(root: Node<'a, 'i>, marvin: bool) -> Vec<Node<'a, 'i>> {
    if marvin {
        root.descendants()
            .filter(|n| is_named(n, "MChemicalStruct"))
            .flat_map(|n| children_named(n, "molecule"))
            .collect()
    } else if is_named(&root, "molecule") {
        vec![root]
    } else {
        children_named(root, "molecule").collect()
    }
}

fn read_flags(model: &mut Model, root: Node) {
    let flag = |name| child_named(root, name).map(text);
    let bool_flag = |name| flag(name).as_deref().and_then(parse_bool);

    if let Some(guid) = flag("customXmlPartGuid").filter(|g| !g.is_empty()) {
        model.custom_xml_part_guid = Some(guid);
    }

    let flags = &mut model.flags;
    if let Some(explicit_c) = bool_flag("explicitC") {
        flags.explicit_c = explicit_c;
    }
    if let Some(explicit_h) = flag("explicitH").as_deref().and_then(HydrogenLabels::from_token) {
        flags.explicit_h = explicit_h;
    }
    if let Some(show) = bool_flag("showColouredAtoms") {
        flags.show_coloured_atoms = show;
    }
    if let Some(show) = bool_flag("showMoleculeGrouping") {
        flags.show_grouping = show;
    }
    if let Some(show) = bool_flag("showMolecularWeight") {
        flags.show_molecular_weight = show;
    }
    if let Some(show) = bool_flag("showMoleculeCaptions") {
        flags.show_captions = show;
    }
}

fn assign_labels(model: &mut Model, options: &ImportOptions) {
    if !options.protected_labels.is_empty() {
        let protected = protected_ids(&options.protected_labels);
        model.relabel(true, &protected);
        model.fill_missing_property_ids(&protected);
    } else if options.relabel {
        model.relabel(false, &HashSet::default());
    }
}

/// Annotations without a symbol size get one scaled to the drawing: the mean bond length, to the nearest multiple of 5
fn backfill_symbol_sizes(model: &mut Model) {
    if model.annotations.iter().all(|a| a.symbol_size > 0.0) {
        return;
    }

    let bond_length = model.mean_bond_length().unwrap_or(DEFAULT_BOND_LENGTH);
    let size = ((bond_length / SYMBOL_SIZE_STEP).round() * SYMBOL_SIZE_STEP).max(SYMBOL_SIZE_STEP);
    for annotation in &mut model.annotations {
        if annotation.symbol_size <= 0.0 {
            annotation.symbol_size = size;
        }
    }
}

//! `Model` → CML, in the house style or in one of the reduced conventions understood by other chemistry editors

mod molecule;
mod reaction;

use std::{borrow::Cow, io};

use ahash::HashSet;
use chemgraph::{BondOrder, DisplayFlags, Model};
use log::debug;
use quick_xml::events::{BytesDecl, Event};

use crate::{
    errors::ExportError,
    xml::{
        C4W_NAMESPACE, CML_NAMESPACE, MARVIN_NAMESPACE, XmlWriter, end, new_writer, start,
        text_element,
    },
};

/// Which flavour of CML to write
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Convention {
    /// Prefixed CML with the `c4w` vendor extensions: nothing in the model is lost
    #[default]
    Default,
    /// Unprefixed CML without vendor data or captions, and with numeric bond orders
    ChemDraw,
    /// A ChemAxon Marvin document, with every molecule flattened to its atoms and bonds
    MarvinJs,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct ExportOptions {
    /// Write everything on a single line instead of indenting by two spaces
    pub compressed: bool,
    pub convention: Convention,
}

/// Writes `model` as CML. If any id in the model is missing, or flattening a molecule for Marvin would leave two atoms
/// or bonds with the same id, a fully relabelled copy is written instead, and the caller's model is left untouched.
///
/// # Errors
///
/// Fails if a bond refers to an atom outside of its molecule, or if a reaction refers to a molecule that isn't part of
/// the model.
pub fn export(model: &Model, options: &ExportOptions) -> Result<String, ExportError> {
    let convention = supported_convention(model, options.convention);
    let clashing = convention == Convention::MarvinJs
        && model.molecules().any(|(_, m)| molecule::flattened_ids_clash(m));

    if model.has_missing_ids() || clashing {
        debug!("the model has missing or clashing ids, so a relabelled copy will be exported");
        let mut healed = model.clone();
        healed.relabel(false, &HashSet::default());
        return write_model(&healed, convention, options.compressed);
    }

    write_model(model, convention, options.compressed)
}

/// Only the default convention can hold more than one top-level molecule
fn supported_convention(model: &Model, requested: Convention) -> Convention {
    if model.molecule_count() > 1 && requested != Convention::Default {
        debug!(
            "{requested:?} can't hold {} top-level molecules, so the default convention will be used",
            model.molecule_count()
        );
        Convention::Default
    } else {
        requested
    }
}

fn write_model(model: &Model, convention: Convention, compressed: bool) -> Result<String, ExportError> {
    model.validate()?;

    let mut writer = new_writer(compressed);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    match convention {
        Convention::Default => write_default(&mut writer, model)?,
        Convention::ChemDraw => write_chemdraw(&mut writer, model)?,
        Convention::MarvinJs => write_marvin(&mut writer, model)?,
    }

    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

// Documents ===========================================================================================================

fn write_default(writer: &mut XmlWriter, model: &Model) -> io::Result<()> {
    let dialect = Dialect(Convention::Default);
    let namespaces = [("xmlns:cml", CML_NAMESPACE), ("xmlns:c4w", C4W_NAMESPACE)];
    start(writer, "cml:cml", &namespaces)?;

    if let Some(guid) = &model.custom_xml_part_guid {
        text_element(writer, "c4w:customXmlPartGuid", &[], guid)?;
    }
    write_flags(writer, &model.flags)?;
    for (_, molecule) in model.molecules() {
        molecule::write_molecule(writer, dialect, molecule)?;
    }
    for scheme in &model.reaction_schemes {
        reaction::write_reaction_scheme(writer, model, scheme)?;
    }
    for annotation in &model.annotations {
        reaction::write_annotation(writer, annotation)?;
    }

    end(writer, "cml:cml")
}

fn write_chemdraw(writer: &mut XmlWriter, model: &Model) -> io::Result<()> {
    let dialect = Dialect(Convention::ChemDraw);
    start(writer, "cml", &[("xmlns", CML_NAMESPACE)])?;
    for (_, molecule) in model.molecules() {
        molecule::write_molecule(writer, dialect, molecule)?;
    }
    end(writer, "cml")
}

fn write_marvin(writer: &mut XmlWriter, model: &Model) -> io::Result<()> {
    let dialect = Dialect(Convention::MarvinJs);
    start(writer, "cml", &[("xmlns", MARVIN_NAMESPACE)])?;
    start(writer, "MDocument", &[])?;
    start(writer, "MChemicalStruct", &[])?;
    for (_, molecule) in model.molecules() {
        molecule::write_flattened(writer, dialect, molecule)?;
    }
    end(writer, "MChemicalStruct")?;
    end(writer, "MDocument")?;
    end(writer, "cml")
}

fn write_flags(writer: &mut XmlWriter, flags: &DisplayFlags) -> io::Result<()> {
    let flags = [
        ("c4w:explicitC", flags.explicit_c.to_string()),
        ("c4w:explicitH", flags.explicit_h.as_str().to_owned()),
        ("c4w:showColouredAtoms", flags.show_coloured_atoms.to_string()),
        ("c4w:showMoleculeGrouping", flags.show_grouping.to_string()),
        ("c4w:showMolecularWeight", flags.show_molecular_weight.to_string()),
        ("c4w:showMoleculeCaptions", flags.show_captions.to_string()),
    ];
    for (tag, value) in flags {
        text_element(writer, tag, &[], &value)?;
    }
    Ok(())
}

// Shared Helpers ======================================================================================================

/// What changes between conventions when writing molecules
#[derive(Copy, Clone, Debug)]
struct Dialect(Convention);

impl Dialect {
    fn tag(self, local: &'static str) -> Cow<'static, str> {
        match self.0 {
            Convention::Default => Cow::Owned(format!("cml:{local}")),
            Convention::ChemDraw | Convention::MarvinJs => Cow::Borrowed(local),
        }
    }

    /// Whether `c4w` attributes, electrons, and captions are written
    const fn vendor(self) -> bool {
        matches!(self.0, Convention::Default)
    }

    const fn order(self, order: BondOrder) -> &'static str {
        if self.vendor() {
            order.as_str()
        } else {
            order.as_numeric_str()
        }
    }
}

/// An attribute list that's built up with a mix of required and optional values
#[derive(Default)]
struct Attributes(Vec<(&'static str, String)>);

impl Attributes {
    fn new() -> Self {
        Self::default()
    }

    fn with(mut self, name: &'static str, value: impl ToString) -> Self {
        self.0.push((name, value.to_string()));
        self
    }

    fn with_some(self, name: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    fn pairs(&self) -> Vec<(&str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }
}

use std::io;

use ahash::{HashSet, HashSetExt};
use chemgraph::{Atom, Bond, BondPlacement, BondStereo, CompassPoint, HydrogenLabels, Molecule};

use super::{Attributes, Dialect};
use crate::xml::{XmlWriter, empty, end, start, text_element};

pub(super) fn write_molecule(
    writer: &mut XmlWriter,
    dialect: Dialect,
    molecule: &Molecule,
) -> io::Result<()> {
    let mut attributes = Attributes::new().with("id", &molecule.id);
    if dialect.vendor() {
        attributes = attributes
            .with_some("formalCharge", molecule.formal_charge)
            .with_some("spinMultiplicity", molecule.spin_multiplicity)
            .with_some("count", molecule.count)
            .with_some("c4w:showBrackets", molecule.show_brackets)
            .with_some("c4w:explicitC", molecule.explicit_c)
            .with_some("c4w:explicitH", molecule.explicit_h.map(HydrogenLabels::as_str));
    }

    let tag = dialect.tag("molecule");
    start(writer, &tag, &attributes.pairs())?;

    write_atoms(writer, dialect, molecule.atoms().map(|(_, atom)| atom))?;
    write_bonds(writer, dialect, molecule.bonds().iter().map(|bond| (molecule, bond)))?;
    for child in molecule.molecules() {
        write_molecule(writer, dialect, child)?;
    }

    for formula in &molecule.formulas {
        let attributes = Attributes::new()
            .with("id", &formula.id)
            .with("convention", &formula.full_type)
            .with("inline", &formula.value);
        empty(writer, &dialect.tag("formula"), &attributes.pairs())?;
    }
    for name in &molecule.names {
        let attributes = Attributes::new()
            .with("id", &name.id)
            .with("dictRef", &name.full_type);
        text_element(writer, &dialect.tag("name"), &attributes.pairs(), &name.value)?;
    }
    if dialect.vendor() {
        for caption in &molecule.captions {
            let attributes = Attributes::new()
                .with("id", &caption.id)
                .with("dictRef", &caption.full_type)
                .with("value", &caption.value);
            empty(writer, &dialect.tag("label"), &attributes.pairs())?;
        }
    }

    end(writer, &tag)
}

/// Writes a molecule as a single bag of atoms and bonds, pulling in everything from its descendants
pub(super) fn write_flattened(
    writer: &mut XmlWriter,
    dialect: Dialect,
    molecule: &Molecule,
) -> io::Result<()> {
    let mut family = Vec::new();
    collect_family(molecule, &mut family);

    start(writer, "molecule", &[("molID", molecule.id.as_str())])?;
    write_atoms(writer, dialect, family.iter().flat_map(|m| m.atoms().map(|(_, atom)| atom)))?;
    write_bonds(
        writer,
        dialect,
        family
            .iter()
            .flat_map(|&m| m.bonds().iter().map(move |bond| (m, bond))),
    )?;
    end(writer, "molecule")
}

/// Whether flattening would write two atoms or bonds with the same id into one `<molecule>`
pub(super) fn flattened_ids_clash(molecule: &Molecule) -> bool {
    let mut family = Vec::new();
    collect_family(molecule, &mut family);

    let mut seen = HashSet::new();
    family
        .into_iter()
        .flat_map(|m| {
            let atoms = m.atoms().map(|(_, atom)| atom.id.as_str());
            atoms.chain(m.bonds().iter().map(|bond| bond.id.as_str()))
        })
        .any(|id| !seen.insert(id))
}

fn collect_family<'m, 'c>(molecule: &'m Molecule<'c>, family: &mut Vec<&'m Molecule<'c>>) {
    family.push(molecule);
    for child in molecule.molecules() {
        collect_family(child, family);
    }
}

// Atoms ===============================================================================================================

fn write_atoms<'a, 'c: 'a>(
    writer: &mut XmlWriter,
    dialect: Dialect,
    atoms: impl Iterator<Item = &'a Atom<'c>>,
) -> io::Result<()> {
    let mut atoms = atoms.peekable();
    if atoms.peek().is_none() {
        return Ok(());
    }

    let tag = dialect.tag("atomArray");
    start(writer, &tag, &[])?;
    for atom in atoms {
        write_atom(writer, dialect, atom)?;
    }
    end(writer, &tag)
}

fn write_atom(writer: &mut XmlWriter, dialect: Dialect, atom: &Atom) -> io::Result<()> {
    let mut attributes = Attributes::new()
        .with("id", &atom.id)
        .with_some("elementType", atom.symbol())
        .with("x2", atom.position.x)
        .with("y2", atom.position.y)
        .with_some("formalCharge", atom.formal_charge)
        .with_some("isotopeNumber", atom.isotope_number);
    if dialect.vendor() {
        attributes = attributes
            .with_some("c4w:explicitC", atom.explicit_c)
            .with_some("c4w:explicitH", atom.explicit_h.map(HydrogenLabels::as_str))
            .with_some(
                "c4w:explicitHPlacement",
                atom.explicit_h_placement.map(CompassPoint::as_str),
            )
            .with_some(
                "c4w:explicitFunctionalGroupPlacement",
                atom.explicit_group_placement.map(CompassPoint::as_str),
            );
    }

    let tag = dialect.tag("atom");
    if !dialect.vendor() || atom.electrons.is_empty() {
        return empty(writer, &tag, &attributes.pairs());
    }

    start(writer, &tag, &attributes.pairs())?;
    for electron in &atom.electrons {
        let attributes = Attributes::new()
            .with("id", &electron.id)
            .with("count", electron.count)
            .with("type", electron.kind.as_str())
            .with_some("placement", electron.placement.map(CompassPoint::as_str));
        empty(writer, "c4w:electron", &attributes.pairs())?;
    }
    end(writer, &tag)
}

// Bonds ===============================================================================================================

/// Bonds are paired with the molecule that owns them, since that's where their atom ids are looked up
fn write_bonds<'m, 'c: 'm>(
    writer: &mut XmlWriter,
    dialect: Dialect,
    bonds: impl Iterator<Item = (&'m Molecule<'c>, &'m Bond)>,
) -> io::Result<()> {
    let mut bonds = bonds.peekable();
    if bonds.peek().is_none() {
        return Ok(());
    }

    let tag = dialect.tag("bondArray");
    start(writer, &tag, &[])?;
    for (molecule, bond) in bonds {
        write_bond(writer, dialect, molecule, bond)?;
    }
    end(writer, &tag)
}

fn write_bond(
    writer: &mut XmlWriter,
    dialect: Dialect,
    molecule: &Molecule,
    bond: &Bond,
) -> io::Result<()> {
    let atom_id = |key| molecule.atom(key).map_or("", |atom| atom.id.as_str());
    let atom_refs = format!("{} {}", atom_id(bond.begin()), atom_id(bond.end()));

    let mut attributes = Attributes::new()
        .with("id", &bond.id)
        .with("atomRefs2", atom_refs)
        .with("order", dialect.order(bond.order));
    if dialect.vendor() {
        attributes =
            attributes.with_some("c4w:placement", bond.placement.map(BondPlacement::as_str));
    }

    let tag = dialect.tag("bond");
    if bond.stereo == BondStereo::None {
        return empty(writer, &tag, &attributes.pairs());
    }

    start(writer, &tag, &attributes.pairs())?;
    text_element(writer, &dialect.tag("bondStereo"), &[], bond.stereo.as_str())?;
    end(writer, &tag)
}

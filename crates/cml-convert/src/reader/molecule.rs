use ahash::{HashMap, HashMapExt};
use chemgraph::{
    Atom, AtomKey, BondOrder, BondPlacement, BondStereo, Catalog, CompassPoint, Electron,
    ElectronKind, ElementOrGroup, HydrogenLabels, Molecule, Point, TextualProperty,
};
use roxmltree::Node;

use super::RecordIssue;
use crate::{
    errors::ImportIssue,
    xml::{attr, children_named, fragment, non_blank_attr, parse_attr, parse_bool, text},
};

/// Maps the display ids found in the document to the keys of the atoms they were read into
type AtomIds = HashMap<String, AtomKey>;

pub(super) fn read_molecule<'c>(catalog: &'c Catalog, raw: &str, node: Node) -> Molecule<'c> {
    let mut molecule = Molecule::new();
    molecule.id = non_blank_attr(node, "id")
        .or_else(|| non_blank_attr(node, "molID"))
        .unwrap_or_default()
        .to_owned();
    molecule.formal_charge = parse_attr(node, "formalCharge");
    molecule.spin_multiplicity = parse_attr(node, "spinMultiplicity");
    molecule.count = parse_attr(node, "count");
    molecule.show_brackets = non_blank_attr(node, "showBrackets").and_then(parse_bool);
    molecule.explicit_c = non_blank_attr(node, "explicitC").and_then(parse_bool);
    molecule.explicit_h = non_blank_attr(node, "explicitH").and_then(HydrogenLabels::from_token);

    // Bonds can only be resolved once every atom of this molecule has been read
    let atom_ids = read_atoms(catalog, raw, node, &mut molecule);
    read_bonds(raw, node, &atom_ids, &mut molecule);

    for child in children_named(node, "molecule") {
        molecule.add_molecule(read_molecule(catalog, raw, child));
    }
    read_properties(node, &mut molecule);

    molecule.normalize_single_atom();
    molecule.split_components();
    molecule
}

// Atoms ===============================================================================================================

fn read_atoms<'c>(catalog: &'c Catalog, raw: &str, node: Node, molecule: &mut Molecule<'c>) -> AtomIds {
    let mut ids = AtomIds::new();

    let atom_nodes = children_named(node, "atomArray")
        .flat_map(|array| children_named(array, "atom"))
        .chain(children_named(node, "atom"));
    for atom_node in atom_nodes {
        let atom = read_atom(catalog, raw, atom_node, molecule);
        register_atom(&mut ids, molecule, atom);
    }

    for array in children_named(node, "atomArray").filter(|a| attr(*a, "atomID").is_some()) {
        for atom in read_atom_array(catalog, raw, array, molecule) {
            register_atom(&mut ids, molecule, atom);
        }
    }

    ids
}

fn register_atom<'c>(ids: &mut AtomIds, molecule: &mut Molecule<'c>, atom: Atom<'c>) {
    let id = atom.id.clone();
    let key = molecule.insert_atom(atom);
    if id.is_empty() {
        return;
    }

    if ids.contains_key(&id) {
        molecule.record(ImportIssue::DuplicateAtomId(id));
    } else {
        ids.insert(id, key);
    }
}

fn read_atom<'c>(catalog: &'c Catalog, raw: &str, node: Node, molecule: &mut Molecule<'c>) -> Atom<'c> {
    let fragment = fragment(raw, node);
    let element = resolve_element(catalog, non_blank_attr(node, "elementType"), fragment, molecule);
    let position = read_position(node).unwrap_or_else(|| {
        molecule.record(ImportIssue::MissingCoordinates(fragment.to_owned()));
        Point::default()
    });

    let mut atom = Atom::new(element, position);
    attr(node, "id").unwrap_or_default().trim().clone_into(&mut atom.id);
    atom.formal_charge = parse_attr(node, "formalCharge");
    atom.isotope_number = parse_attr(node, "isotopeNumber");
    atom.explicit_c = non_blank_attr(node, "explicitC").and_then(parse_bool);
    atom.explicit_h = non_blank_attr(node, "explicitH").and_then(HydrogenLabels::from_token);
    atom.explicit_h_placement =
        non_blank_attr(node, "explicitHPlacement").and_then(CompassPoint::from_token);
    atom.explicit_group_placement = non_blank_attr(node, "explicitFunctionalGroupPlacement")
        .and_then(CompassPoint::from_token);
    atom.electrons = children_named(node, "electron").map(read_electron).collect();
    atom
}

/// Reads the Marvin flavour of atoms, where each attribute of `<atomArray>` holds a whitespace-separated column
fn read_atom_array<'c>(
    catalog: &'c Catalog,
    raw: &str,
    array: Node,
    molecule: &mut Molecule<'c>,
) -> Vec<Atom<'c>> {
    let fragment = fragment(raw, array);
    let column = |name| {
        attr(array, name)
            .map(|values| values.split_whitespace().collect::<Vec<_>>())
            .unwrap_or_default()
    };
    let ids = column("atomID");
    let elements = column("elementType");
    let xs = column("x2");
    let ys = column("y2");
    let charges = column("formalCharge");
    let isotopes = column("isotopeNumber");

    let mut atoms = Vec::with_capacity(ids.len());
    for (i, id) in ids.into_iter().enumerate() {
        let element = resolve_element(catalog, elements.get(i).copied(), fragment, molecule);
        let x = xs.get(i).and_then(|x| x.parse::<f64>().ok());
        let y = ys.get(i).and_then(|y| y.parse::<f64>().ok());
        let position = if let (Some(x), Some(y)) = (x, y) {
            Point { x, y }
        } else {
            molecule.record(ImportIssue::MissingCoordinates(fragment.to_owned()));
            Point::default()
        };

        let mut atom = Atom::new(element, position);
        id.clone_into(&mut atom.id);
        // Columns must give every atom a value, so zeroes stand in for missing charges and isotopes
        atom.formal_charge = charges.get(i).and_then(|c| c.parse::<i32>().ok()).filter(|&c| c != 0);
        atom.isotope_number = isotopes.get(i).and_then(|n| n.parse::<u16>().ok()).filter(|&n| n != 0);
        atoms.push(atom);
    }
    atoms
}

fn resolve_element<'c>(
    catalog: &'c Catalog,
    symbol: Option<&str>,
    fragment: &str,
    molecule: &mut Molecule<'c>,
) -> Option<ElementOrGroup<'c>> {
    let Some(symbol) = symbol else {
        molecule.record(ImportIssue::MissingElement(fragment.to_owned()));
        return None;
    };

    catalog
        .resolve(symbol)
        .map_err(|error| molecule.record(ImportIssue::unknown_element(error, fragment)))
        .ok()
}

fn read_position(node: Node) -> Option<Point> {
    let point = |x, y| {
        Some(Point {
            x: parse_attr(node, x)?,
            y: parse_attr(node, y)?,
        })
    };
    point("x2", "y2").or_else(|| point("x3", "y3"))
}

fn read_electron(node: Node) -> Electron {
    let kind = non_blank_attr(node, "type")
        .and_then(ElectronKind::from_token)
        .unwrap_or(ElectronKind::LonePair);
    let count = parse_attr(node, "count").unwrap_or(match kind {
        ElectronKind::LonePair => 2,
        ElectronKind::Radical => 1,
    });

    let mut electron = Electron::new(count, kind);
    attr(node, "id").unwrap_or_default().trim().clone_into(&mut electron.id);
    electron.placement = non_blank_attr(node, "placement").and_then(CompassPoint::from_token);
    electron
}

// Bonds ===============================================================================================================

struct BondRecord<'a> {
    id: &'a str,
    begin: &'a str,
    end: &'a str,
    order: BondOrder,
    stereo: BondStereo,
    placement: Option<BondPlacement>,
}

fn read_bonds(raw: &str, node: Node, ids: &AtomIds, molecule: &mut Molecule) {
    let bond_nodes = children_named(node, "bondArray")
        .flat_map(|array| children_named(array, "bond"))
        .chain(children_named(node, "bond"));
    for bond_node in bond_nodes {
        let fragment = fragment(raw, bond_node);
        let refs: Vec<_> = attr(bond_node, "atomRefs2")
            .unwrap_or_default()
            .split_whitespace()
            .collect();
        let [begin, end] = refs[..] else {
            molecule.record(ImportIssue::MalformedBondRefs(fragment.to_owned()));
            continue;
        };

        let record = BondRecord {
            id: attr(bond_node, "id").unwrap_or_default().trim(),
            begin,
            end,
            order: BondOrder::from_token(attr(bond_node, "order").unwrap_or_default()),
            stereo: read_stereo(bond_node).unwrap_or_default(),
            placement: non_blank_attr(bond_node, "placement").and_then(BondPlacement::from_token),
        };
        insert_bond(molecule, ids, &record, fragment);
    }

    for array in children_named(node, "bondArray").filter(|a| attr(*a, "atomRef1").is_some()) {
        read_bond_array(raw, array, ids, molecule);
    }
}

/// The Marvin flavour of `read_bonds()`, with columns of atom references instead of `atomRefs2`
fn read_bond_array(raw: &str, array: Node, ids: &AtomIds, molecule: &mut Molecule) {
    let fragment = fragment(raw, array);
    let column = |name| {
        attr(array, name)
            .map(|values| values.split_whitespace().collect::<Vec<_>>())
            .unwrap_or_default()
    };
    let bond_ids = column("bondID");
    let begins = column("atomRef1");
    let ends = column("atomRef2");
    let orders = column("order");

    if begins.len() != ends.len() {
        molecule.record(ImportIssue::MalformedBondRefs(fragment.to_owned()));
        return;
    }

    for (i, (begin, end)) in begins.into_iter().zip(ends).enumerate() {
        let record = BondRecord {
            id: bond_ids.get(i).copied().unwrap_or_default(),
            begin,
            end,
            order: BondOrder::from_token(orders.get(i).copied().unwrap_or_default()),
            stereo: BondStereo::None,
            placement: None,
        };
        insert_bond(molecule, ids, &record, fragment);
    }
}

fn insert_bond(molecule: &mut Molecule, ids: &AtomIds, record: &BondRecord, fragment: &str) {
    let (Some(&begin), Some(&end)) = (ids.get(record.begin), ids.get(record.end)) else {
        let missing = if ids.contains_key(record.begin) {
            record.end
        } else {
            record.begin
        };
        molecule.record(ImportIssue::dangling_bond_ref(missing, fragment));
        return;
    };

    match molecule.add_bond(begin, end) {
        Ok(bond) => {
            record.id.clone_into(&mut bond.id);
            bond.order = record.order;
            bond.stereo = record.stereo;
            bond.placement = record.placement;
        }
        Err(error) => molecule.record(ImportIssue::rejected_bond(error, fragment)),
    }
}

/// The first `<bondStereo>` that means something wins: its text, then its `dictRef`, then an MDL `conventionValue`
fn read_stereo(bond: Node) -> Option<BondStereo> {
    children_named(bond, "bondStereo").find_map(|stereo| {
        BondStereo::from_token(&text(stereo))
            .or_else(|| non_blank_attr(stereo, "dictRef").and_then(BondStereo::from_token))
            .or_else(|| {
                let mdl = non_blank_attr(stereo, "convention") == Some("MDL");
                non_blank_attr(stereo, "conventionValue")
                    .filter(|_| mdl)
                    .and_then(BondStereo::from_mdl)
            })
    })
}

// Textual Properties ==================================================================================================

fn read_properties(node: Node, molecule: &mut Molecule) {
    for name in children_named(node, "name") {
        let full_type = non_blank_attr(name, "dictRef").unwrap_or(TextualProperty::NAME_TYPE);
        molecule.names.push(textual_property(name, full_type, text(name)));
    }

    for formula in children_named(node, "formula") {
        let full_type = non_blank_attr(formula, "convention").unwrap_or(TextualProperty::FORMULA_TYPE);
        let value = non_blank_attr(formula, "inline")
            .or_else(|| non_blank_attr(formula, "concise"))
            .map_or_else(|| text(formula), str::to_owned);
        molecule.formulas.push(textual_property(formula, full_type, value));
    }

    for label in children_named(node, "label") {
        let full_type = non_blank_attr(label, "dictRef").unwrap_or(TextualProperty::CAPTION_TYPE);
        let value = non_blank_attr(label, "value").map_or_else(|| text(label), str::to_owned);
        molecule.captions.push(textual_property(label, full_type, value));
    }
}

fn textual_property(node: Node, full_type: &str, value: String) -> TextualProperty {
    let mut property = TextualProperty::new(full_type, value);
    attr(node, "id").unwrap_or_default().trim().clone_into(&mut property.id);
    property
}

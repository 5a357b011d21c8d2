use once_cell::sync::Lazy;

use crate::{Catalog, Model, Point};

pub static CATALOG: Lazy<Catalog> = Lazy::new(Catalog::default);

/// Builds a single-molecule model from `(symbol, x, y)` atoms and `(begin, end)` bonds given as atom indices
pub fn molecule_model(atoms: &[(&str, f64, f64)], bonds: &[(usize, usize)]) -> Model<'static> {
    let mut model = Model::new(&CATALOG);
    let key = model.add_molecule();
    let molecule = model.molecule_mut(key).unwrap();

    let keys: Vec<_> = atoms
        .iter()
        .map(|&(symbol, x, y)| {
            let element = CATALOG.resolve(symbol).ok();
            molecule.add_atom(element, Point { x, y })
        })
        .collect();
    for &(begin, end) in bonds {
        molecule.add_bond(keys[begin], keys[end]).unwrap();
    }

    model.refresh();
    model
}

/// Ethanol, heavy atoms only: C-C-O
pub fn ethanol() -> Model<'static> {
    molecule_model(
        &[("C", 0.0, 0.0), ("C", 20.0, 0.0), ("O", 30.0, 17.32)],
        &[(0, 1), (1, 2)],
    )
}

/// Benzene as a hexagon of six carbons with alternating bond orders left at their defaults
pub fn benzene() -> Model<'static> {
    let hexagon: Vec<_> = (0..6)
        .map(|i| {
            let angle = f64::from(i) * std::f64::consts::FRAC_PI_3;
            ("C", 20.0 * angle.cos(), 20.0 * angle.sin())
        })
        .collect();
    let ring: Vec<_> = (0..6).map(|i| (i, (i + 1) % 6)).collect();
    molecule_model(&hexagon, &ring)
}

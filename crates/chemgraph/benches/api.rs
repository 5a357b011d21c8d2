use chemgraph::{Catalog, Model, Point, catalog, protected_ids};
use divan::{AllocProfiler, Bencher, black_box};
use once_cell::sync::Lazy;

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

const CATALOG_KDL: &str = catalog::DEFAULT_KDL;
const SYMBOLS: [&str; 8] = ["C", "H", "O", "N", "Cl", "Me", "Ph", "R1"];

static CATALOG: Lazy<Catalog> = Lazy::new(Catalog::default);

/// A long alkane chain with a cyclohexane ring every ten carbons
fn chain(length: u32) -> Model<'static> {
    let mut model = Model::new(&CATALOG);
    let key = model.add_molecule();
    let molecule = model.molecule_mut(key).unwrap();
    let carbon = CATALOG.resolve("C").ok();

    let atoms: Vec<_> = (0..length)
        .map(|i| {
            let position = Point {
                x: f64::from(i) * 20.0,
                y: f64::from(i % 2) * 10.0,
            };
            molecule.add_atom(carbon, position)
        })
        .collect();
    for pair in atoms.windows(2) {
        molecule.add_bond(pair[0], pair[1]).unwrap();
    }
    for ring in atoms.chunks_exact(10) {
        molecule.add_bond(ring[0], ring[5]).unwrap();
    }
    model
}

fn main() {
    Lazy::force(&CATALOG);
    divan::main();
}

mod catalog_lookups {
    use super::*;

    #[divan::bench]
    fn build_catalog() -> Catalog {
        Catalog::from_kdl("catalog.kdl", CATALOG_KDL).unwrap()
    }

    #[divan::bench]
    fn resolve_symbols() {
        for symbol in SYMBOLS {
            black_box(CATALOG.resolve(symbol).unwrap());
        }
    }
}

mod graphs {
    use super::*;

    #[divan::bench(args = [100, 1_000])]
    fn refresh(bencher: Bencher, length: u32) {
        bencher
            .with_inputs(|| chain(length))
            .bench_local_refs(|model| model.refresh());
    }

    #[divan::bench(args = [100, 1_000])]
    fn relabel(bencher: Bencher, length: u32) {
        let protected = protected_ids(["m1.a7:guid"]);
        bencher
            .with_inputs(|| chain(length))
            .bench_local_refs(|model| model.relabel(false, &protected));
    }
}

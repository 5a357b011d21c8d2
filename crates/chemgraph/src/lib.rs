//! An in-memory chemistry graph of atoms, bonds, (nested) molecules, reactions and annotations, along with the
//! catalog of elements and functional groups that atoms are built from, and the engine that assigns hierarchical
//! identifiers across the whole graph

pub mod catalog;
pub mod errors;
mod model;
mod relabel;
#[cfg(test)]
mod testing_tools;

// External Crate Imports
use ahash::HashSet;
use derive_more::{From, IsVariant, Unwrap};
use indexmap::{IndexMap, IndexSet};
use rust_decimal::Decimal;
use serde::Serialize;
use static_assertions::assert_impl_all;

pub use catalog::Catalog;
pub use relabel::protected_ids;

// NOTE: For the types in this module, 'c lifetimes indicate references to the `Catalog` that atoms were resolved
// against. Everything else in the graph is owned.

// Internal Keys =======================================================================================================

// NOTE: This underlying `Id` type is just a synonym since it's private to this crate. There is no way for users to
// directly provide or modify `Id`s, so I don't need to worry about a newtype wrapper here
type Id = usize;

// MISSING: `*Key` types intentionally don't implement `Default`, since it should not be possible for users to
// construct their own: only `Molecule` forges `AtomKey`s, and only `Model` forges `MoleculeKey`s. Unlike display ids,
// keys never change during relabeling, which is what lets bonds and reactions survive it.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub struct AtomKey(Id);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub struct MoleculeKey(Id);

// Catalog Entries =====================================================================================================

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Element {
    symbol: String,
    name: String,
    atomic_number: u8,
    atomic_weight: Decimal,
    valency: Option<u8>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct FunctionalGroup {
    symbol: String,
    name: String,
    composition: Vec<(String, u32)>,
    weight: Decimal,
}

/// What an atom actually *is*: callers must always branch on which of the two is present
#[derive(Copy, Clone, Eq, PartialEq, Debug, From, IsVariant, Unwrap, Serialize)]
pub enum ElementOrGroup<'c> {
    Element(&'c Element),
    Group(&'c FunctionalGroup),
}

// Graph Entities ======================================================================================================

#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Atom<'c> {
    pub id: String,
    pub element: Option<ElementOrGroup<'c>>,
    pub position: Point,
    pub formal_charge: Option<i32>,
    pub isotope_number: Option<u16>,
    pub explicit_c: Option<bool>,
    pub explicit_h: Option<HydrogenLabels>,
    pub explicit_h_placement: Option<CompassPoint>,
    pub explicit_group_placement: Option<CompassPoint>,
    pub electrons: Vec<Electron>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Electron {
    pub id: String,
    pub count: u8,
    pub kind: ElectronKind,
    pub placement: Option<CompassPoint>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Bond {
    pub id: String,
    begin: AtomKey,
    end: AtomKey,
    pub order: BondOrder,
    pub stereo: BondStereo,
    pub placement: Option<BondPlacement>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Molecule<'c> {
    pub id: String,
    #[serde(skip)]
    next_atom: Id,
    atoms: IndexMap<AtomKey, Atom<'c>>,
    bonds: Vec<Bond>,
    molecules: Vec<Molecule<'c>>,
    pub names: Vec<TextualProperty>,
    pub formulas: Vec<TextualProperty>,
    pub captions: Vec<TextualProperty>,
    pub formal_charge: Option<i32>,
    pub spin_multiplicity: Option<u8>,
    pub count: Option<u32>,
    pub show_brackets: Option<bool>,
    pub explicit_c: Option<bool>,
    pub explicit_h: Option<HydrogenLabels>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    properties: MoleculeProperties,
}

/// Derived data, recomputed by `Molecule::refresh()` and never read from or written to CML
#[derive(Clone, PartialEq, Debug, Default, Serialize)]
pub struct MoleculeProperties {
    formula: String,
    weight: Decimal,
    ring_atoms: HashSet<AtomKey>,
    ring_bonds: HashSet<usize>,
    bounds: Option<BoundingBox>,
}

#[derive(Copy, Clone, PartialEq, Debug, Serialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

/// The shared shape of molecule names, formulae, and captions
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct TextualProperty {
    pub id: String,
    pub full_type: String,
    pub value: String,
    pub can_be_deleted: bool,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize)]
pub struct ReactionScheme {
    pub id: String,
    pub reactions: Vec<Reaction>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize)]
pub struct Reaction {
    pub id: String,
    pub tail: Point,
    pub head: Point,
    pub reaction_type: ReactionType,
    pub reagents: Option<String>,
    pub conditions: Option<String>,
    pub reactants: IndexSet<MoleculeKey>,
    pub products: IndexSet<MoleculeKey>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Annotation {
    pub id: String,
    pub position: Point,
    pub symbol_size: f64,
    pub is_editable: bool,
    pub xaml: String,
}

// NOTE: Serializing a `Model` writes the catalog entries its atoms point at, but never the catalog itself.
// Cloning a `Model` is cheap enough to be used by exporters that need to heal a graph without mutating the
// caller's copy. The catalog is only ever borrowed
#[derive(Clone, Debug, Serialize)]
pub struct Model<'c> {
    #[serde(skip)]
    catalog: &'c Catalog,
    #[serde(skip)]
    next_molecule: Id,
    molecules: IndexMap<MoleculeKey, Molecule<'c>>,
    pub reaction_schemes: Vec<ReactionScheme>,
    pub annotations: Vec<Annotation>,
    pub flags: DisplayFlags,
    pub custom_xml_part_guid: Option<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize)]
pub struct DisplayFlags {
    pub explicit_c: bool,
    pub explicit_h: HydrogenLabels,
    pub show_coloured_atoms: bool,
    pub show_grouping: bool,
    pub show_molecular_weight: bool,
    pub show_captions: bool,
}

// Closed Vocabularies =================================================================================================

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize)]
pub enum HydrogenLabels {
    None,
    #[default]
    HeteroAndTerminal,
    All,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub enum CompassPoint {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub enum ElectronKind {
    LonePair,
    Radical,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize)]
pub enum BondOrder {
    /// Stored as `"0"`, which is also the value every unrecognised order token is coerced to
    #[default]
    Other,
    /// Stored as `"hbond"`
    Zero,
    Partial01,
    Single,
    Partial12,
    Aromatic,
    Double,
    Partial23,
    Triple,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize)]
pub enum BondStereo {
    #[default]
    None,
    Wedge,
    Hatch,
    Indeterminate,
    Cis,
    Trans,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub enum BondPlacement {
    Clockwise,
    Anticlockwise,
    Centre,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize)]
pub enum ReactionType {
    #[default]
    Normal,
    Reversible,
    ReversibleBiasedForward,
    ReversibleBiasedReverse,
    Blocked,
    Resonance,
    Retrosynthetic,
    Theoretical,
}

// Thread Safety =======================================================================================================

// NOTE: Nothing here holds interior mutability. A `Model` can be handed between threads, but relabeling still needs
// `&mut` access, so concurrent mutation has to be serialized by the caller
assert_impl_all!(Catalog: Send, Sync);
assert_impl_all!(Model<'static>: Send, Sync, Clone, Serialize);

//! Reads Chemical Markup Language (CML) into a `chemgraph::Model`, and writes models back out in one of three
//! flavours of CML

pub mod errors;
mod reader;
mod writer;
mod xml;
#[cfg(test)]
mod testing_tools;

pub use reader::{ImportOptions, import, import_bytes};
pub use writer::{Convention, ExportOptions, export};

mod aggregate;
mod atom;
mod bond;
mod molecule;
mod properties;
mod vocabulary;

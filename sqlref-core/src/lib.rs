//! sqlref core library exports

pub mod catalog;
pub mod config;
pub mod error;

pub use catalog::{Catalog, Concept, ConceptMatch, Entry, SearchOptions, SharedCatalog};
pub use config::SqlrefConfig;
pub use error::{CatalogError, LookupKind};

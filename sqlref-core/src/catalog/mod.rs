//! sqlref Catalog - SQL cheat-sheet parsing and lookup
//!
//! This module turns a markdown cheat sheet into an immutable, searchable
//! catalog of topics and concepts.
//!
//! # Overview
//!
//! The catalog system allows callers to:
//! - Parse a cheat-sheet document into topic entries
//! - List topics and fetch one by title or number
//! - Search concepts by keyword, by several terms, or by example SQL
//! - Render the catalog back to markdown
//!
//! # Architecture
//!
//! ```text
//! cheatsheet.md (or the built-in document)
//!     │
//!     ▼
//! parse_document()      ← headings, bold sub-headings, code fences, hints
//!     │
//!     ▼
//! CatalogIndex          ← title / id / name maps + token index
//!     │
//!     ▼
//! Catalog               ← list_topics, get_topic, search, ...
//! ```

mod index;
mod model;
mod parser;
mod query;

pub use index::{CatalogIndex, CatalogStats, ConceptMatch, ConceptRef};
pub use model::{render_document, Concept, Entry};
pub use parser::parse_document;
pub use query::{Catalog, SearchOptions, SharedCatalog, BUILTIN_SOURCE_NAME};

/// The cheat sheet shipped with the crate
pub const BUILTIN_DOCUMENT: &str = include_str!("../../data/cheatsheet.md");

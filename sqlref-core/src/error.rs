//! Catalog error types with clear, actionable messages

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// What kind of record a failed lookup was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Topic,
    Concept,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::Topic => f.write_str("Topic"),
            LookupKind::Concept => f.write_str("Concept"),
        }
    }
}

/// Catalog specific errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The requested topic or concept does not exist in the catalog
    #[error("{kind} not found in catalog: '{key}'\n\nRun 'sqlref topics' to list the available topics.")]
    NotFound { kind: LookupKind, key: String },

    /// The document was blank or had no numbered topic headings
    #[error("Document '{source_name}' contains no recognizable topic sections")]
    EmptyDocument { source_name: String },

    /// Failed to read the document from disk
    #[error("Failed to read document from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    pub fn topic_not_found(key: impl Into<String>) -> Self {
        CatalogError::NotFound {
            kind: LookupKind::Topic,
            key: key.into(),
        }
    }

    pub fn concept_not_found(key: impl Into<String>) -> Self {
        CatalogError::NotFound {
            kind: LookupKind::Concept,
            key: key.into(),
        }
    }

    /// Whether this error is a missing-record signal rather than a load failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }
}

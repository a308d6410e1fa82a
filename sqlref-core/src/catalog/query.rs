//! Query interface over the catalog index
//!
//! [`Catalog`] is the externally callable surface: load a document once,
//! then read from it concurrently. [`SharedCatalog`] memoizes the load behind
//! a one-time initialization barrier.

use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::index::{CatalogIndex, CatalogStats, ConceptMatch};
use super::{parse_document, render_document, Entry, BUILTIN_DOCUMENT};
use crate::error::CatalogError;

/// Name reported for the embedded document
pub const BUILTIN_SOURCE_NAME: &str = "built-in";

static BUILTIN: SharedCatalog = SharedCatalog::new();

/// Restrictions applied by [`Catalog::search_with`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Keep at most this many matches
    pub limit: Option<usize>,

    /// Only search within this topic (case-insensitive title)
    pub topic: Option<String>,

    /// Also match the keyword against example SQL
    pub include_examples: bool,

    /// Require every whitespace-separated term to match instead of the whole phrase
    pub all_terms: bool,
}

/// A loaded, immutable cheat-sheet catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    index: CatalogIndex,
    source_name: String,
}

impl Catalog {
    /// Build a catalog from document text, empty if nothing is recognised
    pub fn from_document(text: &str) -> Self {
        Self::from_document_named(text, "<memory>")
    }

    fn from_document_named(text: &str, source_name: &str) -> Self {
        Self {
            index: CatalogIndex::build(parse_document(text)),
            source_name: source_name.to_string(),
        }
    }

    /// Build a catalog from entries that were produced elsewhere
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            index: CatalogIndex::build(entries),
            source_name: "<entries>".to_string(),
        }
    }

    /// A catalog with no topics
    pub fn empty() -> Self {
        Self::from_entries(Vec::new())
    }

    /// Load from document text, failing when it holds no topics
    pub fn load_str(text: &str) -> Result<Self, CatalogError> {
        Self::load_named(text, "<memory>")
    }

    /// Load a document from disk, failing when it is unreadable or holds no topics
    pub fn load_path(path: &Path) -> Result<Self, CatalogError> {
        debug!("Loading cheat-sheet document from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_named(&text, &path.display().to_string())
    }

    fn load_named(text: &str, source_name: &str) -> Result<Self, CatalogError> {
        let catalog = Self::from_document_named(text, source_name);
        if catalog.is_empty() {
            debug!(source = source_name, "Document has no recognizable topic sections");
            return Err(CatalogError::EmptyDocument {
                source_name: source_name.to_string(),
            });
        }

        info!(
            source = source_name,
            topics = catalog.index.entries().len(),
            "Loaded cheat-sheet catalog"
        );
        Ok(catalog)
    }

    /// The catalog of the embedded cheat sheet, parsed once per process
    pub fn builtin() -> Arc<Catalog> {
        BUILTIN.get_or_init(|| Self::from_document_named(BUILTIN_DOCUMENT, BUILTIN_SOURCE_NAME))
    }

    /// Where the catalog was loaded from
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        self.index.entries()
    }

    /// Topic titles in document order
    pub fn list_topics(&self) -> Vec<&str> {
        self.index
            .entries()
            .iter()
            .map(|entry| entry.title.as_str())
            .collect()
    }

    /// Look up a topic by title (case-insensitive)
    pub fn get_topic(&self, title: &str) -> Result<&Entry, CatalogError> {
        self.index
            .topic(title)
            .ok_or_else(|| CatalogError::topic_not_found(title))
    }

    /// Look up a topic by its number
    pub fn get_topic_by_id(&self, topic_id: u32) -> Result<&Entry, CatalogError> {
        self.index
            .topic_by_id(topic_id)
            .ok_or_else(|| CatalogError::topic_not_found(topic_id.to_string()))
    }

    /// Concepts whose name or description contains `keyword`, in document order
    ///
    /// Returns an empty list (not an error) when nothing matches.
    pub fn search(&self, keyword: &str) -> Vec<ConceptMatch<'_>> {
        self.index.search(keyword)
    }

    /// Search with topic restriction, example matching and a result limit
    pub fn search_with(
        &self,
        keyword: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ConceptMatch<'_>>, CatalogError> {
        let topic_id = match options.topic.as_deref() {
            Some(title) => Some(self.get_topic(title)?.topic_id),
            None => None,
        };

        let mut matches = if options.all_terms {
            // Each term may match in the text or, if enabled, in the examples
            self.index.search_terms(keyword, options.include_examples)
        } else {
            self.index.search(keyword)
        };
        if options.include_examples && !options.all_terms {
            matches.extend(self.index.search_examples(keyword));
            matches.sort_by_key(|m| m.position);
            matches.dedup_by_key(|m| m.position);
        }

        if let Some(topic_id) = topic_id {
            matches.retain(|m| m.topic_id == topic_id);
        }
        if let Some(limit) = options.limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }

    /// Concepts containing every whitespace-separated term
    pub fn search_all_terms(&self, query: &str) -> Vec<ConceptMatch<'_>> {
        self.index.search_all_terms(query)
    }

    /// Concepts whose example SQL contains `fragment`
    pub fn search_examples(&self, fragment: &str) -> Vec<ConceptMatch<'_>> {
        self.index.search_examples(fragment)
    }

    /// Concepts named exactly `name` (case-insensitive)
    pub fn find_concept(&self, name: &str) -> Result<Vec<ConceptMatch<'_>>, CatalogError> {
        let found = self.index.concepts_named(name);
        if found.is_empty() {
            return Err(CatalogError::concept_not_found(name));
        }
        Ok(found)
    }

    pub fn stats(&self) -> CatalogStats {
        self.index.stats()
    }

    /// Render the catalog back to markdown
    pub fn to_markdown(&self) -> String {
        render_document(self.index.entries())
    }
}

/// A catalog loaded at most once and shared by every caller
///
/// Concurrent callers of `get_or_load` block until the first load finishes
/// and then share the same `Arc`. A failed load leaves the cell empty.
#[derive(Debug, Default)]
pub struct SharedCatalog {
    cell: OnceCell<Arc<Catalog>>,
}

impl SharedCatalog {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Return the loaded catalog, running `load` if nothing is loaded yet
    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<Catalog>, CatalogError>
    where
        F: FnOnce() -> Result<Catalog, CatalogError>,
    {
        self.cell
            .get_or_try_init(|| load().map(Arc::new))
            .map(Arc::clone)
    }

    /// Infallible variant of `get_or_load`
    pub fn get_or_init<F>(&self, load: F) -> Arc<Catalog>
    where
        F: FnOnce() -> Catalog,
    {
        Arc::clone(self.cell.get_or_init(|| Arc::new(load())))
    }

    /// The loaded catalog, if any
    pub fn get(&self) -> Option<Arc<Catalog>> {
        self.cell.get().cloned()
    }
}

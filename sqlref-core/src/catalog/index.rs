//! Catalog index
//!
//! Lookup structures built once over the parsed entries: topic titles,
//! topic ids, concept names, and an inverted token index over concept
//! names and descriptions. The index is never mutated after `build`, so
//! shared references can be handed to any number of readers.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::trace;

use super::{Concept, Entry};

/// Position of a concept inside the catalog: (topic position, concept position)
///
/// Ordering follows document order, which is the order every search returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConceptRef {
    pub topic: usize,
    pub concept: usize,
}

/// A concept returned by a lookup, together with its topic
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMatch<'a> {
    pub topic_id: u32,
    pub topic_title: &'a str,
    pub concept: &'a Concept,
    #[serde(skip)]
    pub position: ConceptRef,
}

/// Counts over the whole catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub topics: usize,
    pub concepts: usize,
    pub examples: usize,
    pub concepts_without_examples: usize,
    pub tokens: usize,
}

/// Immutable lookup structure over catalog entries
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: Vec<Entry>,

    /// Normalized title -> topic position
    titles: HashMap<String, usize>,

    /// Topic id -> topic position
    topic_ids: HashMap<u32, usize>,

    /// Lowercase concept name -> concepts with that name
    names: HashMap<String, Vec<ConceptRef>>,

    /// Lowercase token -> concepts whose name or description contains it
    tokens: BTreeMap<String, Vec<ConceptRef>>,
}

impl CatalogIndex {
    /// Build the index from entries in document order
    pub fn build(entries: Vec<Entry>) -> Self {
        let mut index = Self::default();

        for (topic, entry) in entries.iter().enumerate() {
            // First occurrence wins when two topics share a title
            index
                .titles
                .entry(normalize_title(&entry.title))
                .or_insert(topic);
            index.topic_ids.insert(entry.topic_id, topic);

            for (position, concept) in entry.concepts.iter().enumerate() {
                let at = ConceptRef {
                    topic,
                    concept: position,
                };

                index
                    .names
                    .entry(normalize_title(&concept.name))
                    .or_default()
                    .push(at);

                let mut seen = BTreeSet::new();
                for token in tokenize(&concept.name)
                    .into_iter()
                    .chain(tokenize(&concept.description))
                {
                    if seen.insert(token.clone()) {
                        index.tokens.entry(token).or_default().push(at);
                    }
                }
            }
        }

        index.entries = entries;
        trace!(
            topics = index.entries.len(),
            names = index.names.len(),
            tokens = index.tokens.len(),
            "Built catalog index"
        );
        index
    }

    /// All entries, in document order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a topic by title (case-insensitive, whitespace-insensitive)
    pub fn topic(&self, title: &str) -> Option<&Entry> {
        self.titles
            .get(&normalize_title(title))
            .map(|&pos| &self.entries[pos])
    }

    /// Look up a topic by its number
    pub fn topic_by_id(&self, topic_id: u32) -> Option<&Entry> {
        self.topic_ids.get(&topic_id).map(|&pos| &self.entries[pos])
    }

    /// Concepts whose name equals `name` (case-insensitive), in document order
    pub fn concepts_named(&self, name: &str) -> Vec<ConceptMatch<'_>> {
        match self.names.get(&normalize_title(name)) {
            Some(refs) => self.resolve(refs.iter().copied()),
            None => Vec::new(),
        }
    }

    /// Search concept names and descriptions for a keyword
    ///
    /// Matches when the keyword is a substring (case-insensitive) of the
    /// concept's name or description. A blank keyword matches nothing.
    pub fn search(&self, keyword: &str) -> Vec<ConceptMatch<'_>> {
        self.resolve(self.keyword_hits(keyword))
    }

    /// Concepts matching every whitespace-separated term
    pub fn search_all_terms(&self, query: &str) -> Vec<ConceptMatch<'_>> {
        self.search_terms(query, false)
    }

    /// Concepts matching every term, where with `include_examples` a term may
    /// match in the concept's examples instead of its name or description
    pub fn search_terms(&self, query: &str, include_examples: bool) -> Vec<ConceptMatch<'_>> {
        let term_hits = |term: &str| {
            let mut hits = self.keyword_hits(term);
            if include_examples {
                hits.extend(self.example_hits(term));
            }
            hits
        };

        let mut terms = query.split_whitespace();
        let Some(first) = terms.next() else {
            return Vec::new();
        };

        let mut hits = term_hits(first);
        for term in terms {
            if hits.is_empty() {
                break;
            }
            let next = term_hits(term);
            hits = hits.intersection(&next).copied().collect();
        }
        self.resolve(hits)
    }

    /// Concepts with at least one example containing `fragment` (case-insensitive)
    pub fn search_examples(&self, fragment: &str) -> Vec<ConceptMatch<'_>> {
        self.resolve(self.example_hits(fragment))
    }

    pub fn stats(&self) -> CatalogStats {
        let concepts = self.entries.iter().flat_map(|e| &e.concepts);
        CatalogStats {
            topics: self.entries.len(),
            concepts: concepts.clone().count(),
            examples: concepts.clone().map(|c| c.examples.len()).sum(),
            concepts_without_examples: concepts.filter(|c| !c.has_examples()).count(),
            tokens: self.tokens.len(),
        }
    }

    /// Concept positions matching a keyword, in document order
    pub(crate) fn keyword_hits(&self, keyword: &str) -> BTreeSet<ConceptRef> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return BTreeSet::new();
        }

        if needle.chars().all(is_token_char) {
            // A needle without separators can only occur inside a single token
            self.token_hits(&needle)
        } else {
            self.scan(&needle)
        }
    }

    fn example_hits(&self, fragment: &str) -> BTreeSet<ConceptRef> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return BTreeSet::new();
        }

        self.all_refs()
            .filter(|at| {
                self.concept_at(*at)
                    .examples
                    .iter()
                    .any(|example| example.to_lowercase().contains(&needle))
            })
            .collect()
    }

    fn token_hits(&self, needle: &str) -> BTreeSet<ConceptRef> {
        self.tokens
            .iter()
            .filter(|(token, _)| token.contains(needle))
            .flat_map(|(_, refs)| refs.iter().copied())
            .collect()
    }

    fn scan(&self, needle: &str) -> BTreeSet<ConceptRef> {
        self.all_refs()
            .filter(|at| {
                let concept = self.concept_at(*at);
                concept.name.to_lowercase().contains(needle)
                    || concept.description.to_lowercase().contains(needle)
            })
            .collect()
    }

    fn all_refs(&self) -> impl Iterator<Item = ConceptRef> + '_ {
        self.entries.iter().enumerate().flat_map(|(topic, entry)| {
            (0..entry.concepts.len()).map(move |concept| ConceptRef { topic, concept })
        })
    }

    fn concept_at(&self, at: ConceptRef) -> &Concept {
        &self.entries[at.topic].concepts[at.concept]
    }

    fn resolve(&self, refs: impl IntoIterator<Item = ConceptRef>) -> Vec<ConceptMatch<'_>> {
        refs.into_iter()
            .map(|at| {
                let entry = &self.entries[at.topic];
                ConceptMatch {
                    topic_id: entry.topic_id,
                    topic_title: &entry.title,
                    concept: &entry.concepts[at.concept],
                    position: at,
                }
            })
            .collect()
    }
}

/// Lowercase with runs of whitespace collapsed, the key for every name lookup
pub(crate) fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Lowercase alphanumeric runs of `text`
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !is_token_char(c))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

//! Topic and concept records parsed from a cheat-sheet document
//!
//! Both records are built once by the parser and never mutated afterwards.
//! Their `Display` impls render back to the same markdown dialect the
//! parser reads, so `parse(render(entry)) == entry`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::index::normalize_title;

/// One topic section of the document (e.g. "3. Joins")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Topic number, unique and strictly increasing in document order
    pub topic_id: u32,

    /// Human-readable topic name
    pub title: String,

    /// Prose between the topic heading and its first concept
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,

    /// Concepts in document order
    #[serde(default)]
    pub concepts: Vec<Concept>,
}

/// One named SQL feature within a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    /// Short identifier (e.g. "INNER JOIN")
    pub name: String,

    /// Free-text explanation, paragraphs separated by a blank line
    #[serde(default)]
    pub description: String,

    /// Literal SQL snippets, in document order. May be empty.
    #[serde(default)]
    pub examples: Vec<String>,

    /// "Use when..." guidance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_hint: Option<String>,
}

impl Entry {
    /// Find a concept of this topic by name
    ///
    /// Uses the same case and whitespace folding as the catalog index.
    pub fn concept(&self, name: &str) -> Option<&Concept> {
        let key = normalize_title(name);
        self.concepts
            .iter()
            .find(|c| normalize_title(&c.name) == key)
    }

    /// Concept names in document order
    pub fn concept_names(&self) -> Vec<&str> {
        self.concepts.iter().map(|c| c.name.as_str()).collect()
    }

    /// Total number of examples across all concepts
    pub fn example_count(&self) -> usize {
        self.concepts.iter().map(|c| c.examples.len()).sum()
    }
}

impl Concept {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            examples: Vec::new(),
            usage_hint: None,
        }
    }

    pub fn has_examples(&self) -> bool {
        !self.examples.is_empty()
    }

    /// First paragraph of the description
    pub fn short_description(&self) -> &str {
        self.description
            .split("\n\n")
            .next()
            .unwrap_or(&self.description)
            .trim()
    }
}

/// Render a whole catalog back to markdown
pub fn render_document(entries: &[Entry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## {}. {}", self.topic_id, self.title)?;

        if !self.summary.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", self.summary)?;
        }

        for concept in &self.concepts {
            writeln!(f)?;
            write!(f, "{concept}")?;
        }

        Ok(())
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "**{}**", self.name)?;

        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
        }

        for example in &self.examples {
            let fence = fence_for(example);
            writeln!(f, "{fence}sql")?;
            writeln!(f, "{example}")?;
            writeln!(f, "{fence}")?;
        }

        if let Some(hint) = &self.usage_hint {
            let lower = hint.to_lowercase();
            if lower.starts_with("use when") || lower.starts_with("use it when") {
                writeln!(f, "*{hint}*")?;
            } else {
                writeln!(f, "*Hint: {hint}*")?;
            }
        }

        Ok(())
    }
}

/// A fence that no line of `example` can close
///
/// Uses whichever of backtick and tilde has the shorter longest run in the
/// example, one character longer than that run (at least three).
fn fence_for(example: &str) -> String {
    let backticks = longest_run(example, '`');
    let tildes = longest_run(example, '~');
    let (marker, run) = if backticks <= tildes {
        ('`', backticks)
    } else {
        ('~', tildes)
    };
    marker.to_string().repeat((run + 1).max(3))
}

fn longest_run(text: &str, marker: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == marker {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

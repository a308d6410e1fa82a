//! sqlref catalog commands
//!
//! Each subcommand reads from an already loaded [`Catalog`] and prints either
//! human-readable text/tables or JSON.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::Path;
use std::sync::Arc;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::{debug, warn};

use sqlref_core::{
    Catalog, CatalogError, Concept, ConceptMatch, Entry, SearchOptions, SqlrefConfig,
};

const DESCRIPTION_WIDTH: usize = 60;

#[derive(Subcommand, Debug)]
pub enum CatalogSubcommand {
    /// List every topic in document order
    Topics,

    /// Show a topic with its concepts and examples
    Show {
        /// Topic title (case-insensitive), or its number with --id
        #[clap(required = true, num_args = 1..)]
        topic: Vec<String>,

        /// Treat the argument as a topic number
        #[clap(long)]
        id: bool,
    },

    /// Search concept names and descriptions
    Search {
        /// Keyword or phrase to look for
        #[clap(required = true, num_args = 1..)]
        keyword: Vec<String>,

        /// Only search within this topic
        #[clap(long)]
        topic: Option<String>,

        /// Also match example SQL
        #[clap(long)]
        examples: bool,

        /// Do not match example SQL, even if the config enables it
        #[clap(long, conflicts_with = "examples")]
        no_examples: bool,

        /// Maximum number of results
        #[clap(long)]
        limit: Option<usize>,

        /// Require every word to match instead of the whole phrase
        #[clap(long)]
        all: bool,
    },

    /// Show every concept with this exact name
    Concept {
        #[clap(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Find examples containing a SQL fragment
    Examples {
        #[clap(required = true, num_args = 1..)]
        fragment: Vec<String>,
    },

    /// Summarize the loaded catalog
    Stats,

    /// Print the whole catalog as markdown (or entries as JSON with --json)
    Export,
}

impl CatalogSubcommand {
    pub fn execute(self, catalog: &Catalog, config: &SqlrefConfig, json: bool) -> Result<()> {
        match self {
            CatalogSubcommand::Topics => execute_topics(catalog, json),
            CatalogSubcommand::Show { topic, id } => execute_show(catalog, &topic.join(" "), id, json),
            CatalogSubcommand::Search {
                keyword,
                topic,
                examples,
                no_examples,
                limit,
                all,
            } => {
                let mut options = config.search_options();
                options.topic = topic;
                if examples {
                    options.include_examples = true;
                } else if no_examples {
                    options.include_examples = false;
                }
                options.all_terms = all;
                if limit.is_some() {
                    options.limit = limit;
                }
                execute_search(catalog, &keyword.join(" "), &options, json)
            }
            CatalogSubcommand::Concept { name } => execute_concept(catalog, &name.join(" "), json),
            CatalogSubcommand::Examples { fragment } => {
                execute_examples(catalog, &fragment.join(" "), json)
            }
            CatalogSubcommand::Stats => execute_stats(catalog, json),
            CatalogSubcommand::Export => execute_export(catalog, json),
        }
    }
}

/// Load the configured document, or the built-in cheat sheet when none is set
///
/// A document without any topic sections is reported once and replaced by an
/// empty catalog so every command still runs.
pub fn load_catalog(document: Option<&Path>) -> Result<Arc<Catalog>> {
    let Some(path) = document else {
        debug!("No document configured, using the built-in cheat sheet");
        return Ok(Catalog::builtin());
    };

    match Catalog::load_path(path) {
        Ok(catalog) => Ok(Arc::new(catalog)),
        Err(err @ CatalogError::EmptyDocument { .. }) => {
            warn!("{err}");
            Ok(Arc::new(Catalog::empty()))
        }
        Err(err) => Err(err).context("Failed to load cheat-sheet document"),
    }
}

/// Table row for the topic listing
#[derive(Tabled)]
struct TopicRow {
    #[tabled(rename = "#")]
    id: u32,
    #[tabled(rename = "Topic")]
    title: String,
    #[tabled(rename = "Concepts")]
    concepts: usize,
    #[tabled(rename = "Examples")]
    examples: usize,
}

fn execute_topics(catalog: &Catalog, json: bool) -> Result<()> {
    if json {
        let topics: Vec<serde_json::Value> = catalog
            .entries()
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "topicId": entry.topic_id,
                    "title": entry.title,
                    "concepts": entry.concept_names(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&topics)?);
        return Ok(());
    }

    if catalog.is_empty() {
        println!("No topics in catalog.");
        return Ok(());
    }

    let rows: Vec<TopicRow> = catalog
        .entries()
        .iter()
        .map(|entry| TopicRow {
            id: entry.topic_id,
            title: entry.title.clone(),
            concepts: entry.concepts.len(),
            examples: entry.example_count(),
        })
        .collect();

    print_table(&rows);
    Ok(())
}

fn execute_show(catalog: &Catalog, topic: &str, by_id: bool, json: bool) -> Result<()> {
    let entry = if by_id {
        let topic_id: u32 = topic
            .trim()
            .parse()
            .with_context(|| format!("Topic number must be a positive integer, got '{topic}'"))?;
        catalog.get_topic_by_id(topic_id)?
    } else {
        catalog.get_topic(topic)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(entry)?);
    } else {
        print_entry(entry);
    }
    Ok(())
}

/// Table row for search results
#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "Topic")]
    topic: String,
    #[tabled(rename = "Concept")]
    concept: String,
    #[tabled(rename = "Description")]
    description: String,
}

fn execute_search(
    catalog: &Catalog,
    keyword: &str,
    options: &SearchOptions,
    json: bool,
) -> Result<()> {
    let matches = catalog.search_with(keyword, options)?;
    debug!(keyword, found = matches.len(), "Search finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("No concepts found for '{keyword}'.");
        return Ok(());
    }

    println!("Found {} concept(s):\n", matches.len());
    let rows: Vec<MatchRow> = matches
        .iter()
        .map(|m| MatchRow {
            topic: format!("{}. {}", m.topic_id, m.topic_title),
            concept: m.concept.name.clone(),
            description: truncate(m.concept.short_description(), DESCRIPTION_WIDTH),
        })
        .collect();

    print_table(&rows);
    Ok(())
}

fn execute_concept(catalog: &Catalog, name: &str, json: bool) -> Result<()> {
    let found = catalog.find_concept(name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    for (i, m) in found.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("[{}. {}]", m.topic_id, m.topic_title);
        print_concept(m.concept);
    }
    Ok(())
}

fn execute_examples(catalog: &Catalog, fragment: &str, json: bool) -> Result<()> {
    let found = catalog.search_examples(fragment);

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    if found.is_empty() {
        println!("No examples contain '{fragment}'.");
        return Ok(());
    }

    let needle = fragment.trim().to_lowercase();
    for (i, m) in found.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_match_heading(m);
        for example in m
            .concept
            .examples
            .iter()
            .filter(|example| example.to_lowercase().contains(&needle))
        {
            println!();
            print_indented(example, 4);
        }
    }
    Ok(())
}

fn execute_stats(catalog: &Catalog, json: bool) -> Result<()> {
    let stats = catalog.stats();

    if json {
        let output = serde_json::json!({
            "source": catalog.source_name(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Source:   {}", catalog.source_name());
    println!("Topics:   {}", stats.topics);
    println!("Concepts: {}", stats.concepts);
    println!("Examples: {}", stats.examples);
    if stats.concepts_without_examples > 0 {
        println!("Concepts without examples: {}", stats.concepts_without_examples);
    }
    println!("Indexed terms: {}", stats.tokens);
    Ok(())
}

fn execute_export(catalog: &Catalog, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(catalog.entries())?);
    } else {
        print!("{}", catalog.to_markdown());
    }
    Ok(())
}

fn print_table<T: Tabled>(rows: &[T]) {
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();
    println!("{table}");
}

fn print_entry(entry: &Entry) {
    println!("{}. {}", entry.topic_id, entry.title);
    println!("{}", "=".repeat(entry.title.chars().count() + 4));
    if !entry.summary.is_empty() {
        println!();
        print_indented(&entry.summary, 0);
    }
    for concept in &entry.concepts {
        println!();
        print_concept(concept);
    }
}

fn print_match_heading(m: &ConceptMatch<'_>) {
    println!("[{}. {}] {}", m.topic_id, m.topic_title, m.concept.name);
}

fn print_concept(concept: &Concept) {
    println!("{}", concept.name);
    if !concept.description.is_empty() {
        print_indented(&concept.description, 2);
    }
    if let Some(hint) = &concept.usage_hint {
        println!("  Hint: {hint}");
    }
    for example in &concept.examples {
        println!();
        print_indented(example, 4);
    }
}

fn print_indented(text: &str, width: usize) {
    for line in text.lines() {
        if line.is_empty() {
            println!();
        } else {
            println!("{:width$}{line}", "");
        }
    }
}

/// Shorten `text` to at most `max` characters, marking the cut with "..."
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

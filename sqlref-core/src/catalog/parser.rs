//! Markdown cheat-sheet parser
//!
//! Turns a document into topic [`Entry`] records. The recognised dialect:
//!
//! - `## 3. Joins` starts topic 3. Any ATX heading of level 1-3 whose text
//!   starts with a number opens a topic.
//! - `**INNER JOIN**` (optionally as a list item, optionally followed by
//!   `: text`) or a heading deeper than the topic heading starts a concept.
//! - Fenced code blocks become the current concept's examples.
//! - `*Use when ...*`, `Hint: ...`, `Tip: ...` lines become the usage hint.
//! - Everything else is prose for the current concept, or the topic summary
//!   before the first concept.
//!
//! An unnumbered heading at topic level closes the topic. Parsing is a pure
//! function over the input and never fails; a document without topic headings
//! yields no entries.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace, warn};

use super::{Concept, Entry};

/// Deepest heading level that can open a topic
const MAX_TOPIC_LEVEL: usize = 3;

/// Hint openers kept as part of the hint sentence
const HINT_SENTENCES: &[&str] = &["use when", "use it when"];

/// Hint labels stripped from the hint text
const HINT_LABELS: &[&str] = &["use case:", "usage:", "hint:", "tip:"];

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*#*$").expect("heading pattern is valid"));

static TOPIC_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)[.)]?\s+(.+)$").expect("topic number pattern is valid"));

static BOLD_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[-*+]\s+)?\*\*(.+?)\*\*\s*(?:[:\u{2013}\u{2014}-]\s*)?(.*)$")
        .expect("bold heading pattern is valid")
});

/// Parse a cheat-sheet document into topic entries, in document order
pub fn parse_document(text: &str) -> Vec<Entry> {
    let mut parser = DocumentParser::default();
    for line in text.lines() {
        parser.feed(line.strip_suffix('\r').unwrap_or(line));
    }
    let entries = parser.finish();

    debug!(
        topics = entries.len(),
        concepts = entries.iter().map(|e| e.concepts.len()).sum::<usize>(),
        "Parsed cheat-sheet document"
    );
    entries
}

#[derive(Default)]
struct DocumentParser {
    entries: Vec<Entry>,
    section: Option<SectionBuilder>,
    fence: Option<OpenFence>,
    last_topic_id: Option<u32>,
}

impl DocumentParser {
    fn feed(&mut self, line: &str) {
        if let Some(fence) = self.fence.as_mut() {
            if !fence.closed_by(line) {
                fence.push(line);
                return;
            }
            if let Some(fence) = self.fence.take() {
                self.add_example(fence.into_example());
            }
            return;
        }

        let trimmed = line.trim();

        if let Some(marker) = fence_marker(trimmed) {
            if let Some(section) = self.section.as_mut() {
                section.prose().break_paragraph();
            }
            // Fences outside a topic are still tracked so their content is never
            // mistaken for headings
            self.fence = Some(OpenFence::new(marker, leading_indent(line)));
            return;
        }

        if let Some(caps) = HEADING.captures(trimmed) {
            self.heading(caps[1].len(), &caps[2]);
            return;
        }

        let Some(section) = self.section.as_mut() else {
            return;
        };

        if trimmed.is_empty() {
            section.prose().break_paragraph();
            return;
        }

        if is_thematic_break(trimmed) {
            return;
        }

        if let Some(hint) = usage_hint(trimmed) {
            if let Some(concept) = section.concepts.last_mut() {
                concept.add_hint(hint);
                return;
            }
        }

        if let Some(caps) = BOLD_HEADING.captures(trimmed) {
            section.start_concept(&caps[1], &caps[2]);
            return;
        }

        section.prose().push(trimmed);
    }

    fn heading(&mut self, level: usize, text: &str) {
        if let Some(section) = self.section.as_mut() {
            if level > section.level {
                section.start_concept(text, "");
                return;
            }
        }

        self.close_section();

        if level > MAX_TOPIC_LEVEL {
            return;
        }

        match TOPIC_NUMBER.captures(text) {
            Some(caps) => {
                let requested = caps[1].parse::<u32>().ok();
                let title = strip_emphasis(&caps[2]);
                self.open_section(requested, title, level);
            }
            None => trace!(heading = text, "Skipping unnumbered section"),
        }
    }

    fn open_section(&mut self, requested: Option<u32>, title: &str, level: usize) {
        let topic_id = match (requested, self.last_topic_id) {
            (Some(id), Some(prev)) if id > prev => id,
            (Some(id), None) => id,
            (_, prev) => {
                let Some(repaired) = prev.map_or(Some(1), |p| p.checked_add(1)) else {
                    warn!(
                        title,
                        "No topic number left after the previous topic, dropping section"
                    );
                    return;
                };
                warn!(
                    title,
                    requested = ?requested,
                    assigned = repaired,
                    "Topic number out of order, renumbering"
                );
                repaired
            }
        };

        trace!(topic_id, title, "Opening topic section");
        self.last_topic_id = Some(topic_id);
        self.section = Some(SectionBuilder {
            topic_id,
            title: title.to_string(),
            level,
            summary: Prose::default(),
            concepts: Vec::new(),
        });
    }

    fn close_section(&mut self) {
        if let Some(section) = self.section.take() {
            self.entries.push(section.build());
        }
    }

    fn add_example(&mut self, example: Option<String>) {
        let (Some(section), Some(example)) = (self.section.as_mut(), example) else {
            return;
        };

        if section.concepts.is_empty() {
            // Code before the first concept belongs to an overview concept
            let overview = ConceptBuilder::new(&section.title);
            section.concepts.push(overview);
        }
        if let Some(concept) = section.concepts.last_mut() {
            concept.examples.push(example);
        }
    }

    fn finish(mut self) -> Vec<Entry> {
        if let Some(fence) = self.fence.take() {
            self.add_example(fence.into_example());
        }
        self.close_section();
        self.entries
    }
}

struct SectionBuilder {
    topic_id: u32,
    title: String,
    level: usize,
    summary: Prose,
    concepts: Vec<ConceptBuilder>,
}

impl SectionBuilder {
    /// Prose buffer for the current concept, or the summary before any concept
    fn prose(&mut self) -> &mut Prose {
        match self.concepts.last_mut() {
            Some(concept) => &mut concept.description,
            None => &mut self.summary,
        }
    }

    fn start_concept(&mut self, name: &str, inline_text: &str) {
        let mut concept = ConceptBuilder::new(name);
        let inline_text = inline_text.trim();
        if !inline_text.is_empty() {
            concept.description.push(inline_text);
        }
        self.concepts.push(concept);
    }

    fn build(self) -> Entry {
        Entry {
            topic_id: self.topic_id,
            title: self.title,
            summary: self.summary.finish(),
            concepts: self.concepts.into_iter().map(ConceptBuilder::build).collect(),
        }
    }
}

struct ConceptBuilder {
    name: String,
    description: Prose,
    examples: Vec<String>,
    usage_hint: Option<String>,
}

impl ConceptBuilder {
    fn new(name: &str) -> Self {
        let name = strip_emphasis(name);
        Self {
            name: name.trim_end_matches(':').trim_end().to_string(),
            description: Prose::default(),
            examples: Vec::new(),
            usage_hint: None,
        }
    }

    fn add_hint(&mut self, hint: String) {
        match self.usage_hint.as_mut() {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(&hint);
            }
            None => self.usage_hint = Some(hint),
        }
    }

    fn build(self) -> Concept {
        Concept {
            name: self.name,
            description: self.description.finish(),
            examples: self.examples,
            usage_hint: self.usage_hint,
        }
    }
}

/// Accumulates prose lines into paragraphs
#[derive(Default)]
struct Prose {
    paragraphs: Vec<String>,
    current: Vec<String>,
}

impl Prose {
    fn push(&mut self, line: &str) {
        self.current.push(line.to_string());
    }

    fn break_paragraph(&mut self) {
        if !self.current.is_empty() {
            self.paragraphs.push(self.current.join(" "));
            self.current.clear();
        }
    }

    fn finish(mut self) -> String {
        self.break_paragraph();
        self.paragraphs.join("\n\n")
    }
}

struct OpenFence {
    marker: String,
    indent: usize,
    lines: Vec<String>,
}

impl OpenFence {
    fn new(marker: &str, indent: usize) -> Self {
        Self {
            marker: marker.to_string(),
            indent,
            lines: Vec::new(),
        }
    }

    /// A fence closes on a run of the same character at least as long as the opener
    fn closed_by(&self, line: &str) -> bool {
        let trimmed = line.trim();
        match fence_marker(trimmed) {
            Some(marker) => {
                marker.starts_with(&self.marker) && trimmed[marker.len()..].trim().is_empty()
            }
            None => false,
        }
    }

    fn push(&mut self, line: &str) {
        self.lines.push(strip_indent(line, self.indent).to_string());
    }

    /// The block without leading/trailing blank lines, or `None` if empty
    fn into_example(self) -> Option<String> {
        let start = self.lines.iter().position(|l| !l.trim().is_empty())?;
        let end = self.lines.iter().rposition(|l| !l.trim().is_empty())?;
        Some(self.lines[start..=end].join("\n"))
    }
}

/// The run of backticks or tildes opening a fenced block
fn fence_marker(trimmed: &str) -> Option<&str> {
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let len = trimmed.chars().take_while(|c| *c == first).count();
    (len >= 3).then(|| &trimmed[..len])
}

fn leading_indent(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

/// Remove up to `indent` leading spaces or tabs
fn strip_indent(line: &str, indent: usize) -> &str {
    let cut = line
        .char_indices()
        .take(indent)
        .take_while(|(_, c)| *c == ' ' || *c == '\t')
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    &line[cut..]
}

fn is_thematic_break(trimmed: &str) -> bool {
    let compact: Vec<char> = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3 && ['-', '*', '_'].iter().any(|m| compact.iter().all(|c| c == m))
}

fn strip_emphasis(text: &str) -> &str {
    text.trim()
        .trim_start_matches("**")
        .trim_end_matches("**")
        .trim()
}

/// Strip one pair of emphasis markers wrapping the whole text
fn unwrap_emphasis(text: &str) -> &str {
    for marker in ["**", "__", "*", "_"] {
        if text.len() > 2 * marker.len()
            && text.starts_with(marker)
            && text.ends_with(marker)
        {
            return text[marker.len()..text.len() - marker.len()].trim();
        }
    }
    text
}

/// Drop the bold markers around a leading label (`**Hint:** text`)
fn unbold_lead(text: &str) -> String {
    for marker in ["**", "__"] {
        if let Some(rest) = text.strip_prefix(marker) {
            if let Some(end) = rest.find(marker) {
                return format!("{}{}", &rest[..end], &rest[end + marker.len()..]);
            }
        }
    }
    text.to_string()
}

/// Extract the usage hint from a line, if the line is one
fn usage_hint(trimmed: &str) -> Option<String> {
    let mut text = trimmed.trim_start_matches('>').trim_start();
    for marker in ["- ", "* ", "+ "] {
        if let Some(rest) = text.strip_prefix(marker) {
            text = rest.trim_start();
            break;
        }
    }

    let cleaned = unbold_lead(unwrap_emphasis(text));
    let cleaned = cleaned.as_str();

    let starts_with = |prefix: &str| {
        cleaned
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };

    if HINT_SENTENCES.iter().any(|p| starts_with(*p)) {
        return Some(cleaned.to_string());
    }

    HINT_LABELS
        .iter()
        .find(|label| starts_with(**label))
        .map(|label| cleaned[label.len()..].trim())
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const JOINS: &str = r#"# SQL Cheat Sheet

Intro text that belongs to no topic.

## 1. Basic Querying

**SELECT**
Chooses columns.
```sql
SELECT name FROM employees;
```

## 2. Joins

Joins combine tables.

**INNER JOIN**
Matching rows only.
Second line of the same paragraph.

A new paragraph.
```sql
SELECT *
FROM a
JOIN b ON a.id = b.a_id;
```
*Use when you only want rows on both sides.*

**RIGHT JOIN**
Keeps every right-hand row.
"#;

    #[test]
    fn test_parse_topics_in_order() {
        let entries = parse_document(JOINS);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].topic_id, 1);
        assert_eq!(entries[0].title, "Basic Querying");
        assert_eq!(entries[1].topic_id, 2);
        assert_eq!(entries[1].title, "Joins");
        assert_eq!(entries[1].summary, "Joins combine tables.");
    }

    #[test]
    fn test_parse_concept_fields() {
        let entries = parse_document(JOINS);
        let inner = &entries[1].concepts[0];

        assert_eq!(inner.name, "INNER JOIN");
        assert_eq!(
            inner.description,
            "Matching rows only. Second line of the same paragraph.\n\nA new paragraph."
        );
        assert_eq!(
            inner.examples,
            vec!["SELECT *\nFROM a\nJOIN b ON a.id = b.a_id;".to_string()]
        );
        assert_eq!(
            inner.usage_hint.as_deref(),
            Some("Use when you only want rows on both sides.")
        );

        let right = &entries[1].concepts[1];
        assert_eq!(right.name, "RIGHT JOIN");
        assert!(right.examples.is_empty());
        assert!(right.usage_hint.is_none());
    }

    #[test]
    fn test_no_headings_yields_nothing() {
        assert!(parse_document("").is_empty());
        assert!(parse_document("   \n\n").is_empty());
        assert!(parse_document("Just prose.\n**Bold** words.\n```sql\nSELECT 1;\n```").is_empty());
        assert!(parse_document("# Title without number\n## Another").is_empty());
    }

    #[test]
    fn test_headings_inside_fences_are_content() {
        let doc = "## 1. Comments\n**Line comments**\n```sql\n-- note\n## 2. not a topic\n```\n";
        let entries = parse_document(doc);
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].concepts[0].examples,
            vec!["-- note\n## 2. not a topic".to_string()]
        );
    }

    #[test]
    fn test_topic_after_largest_id_is_dropped() {
        let doc = "## 4294967295. A\n**X**\n## 5. B\n**Y**\n## 6. C\n";
        let entries = parse_document(doc);
        let ids: Vec<u32> = entries.iter().map(|e| e.topic_id).collect();
        assert_eq!(ids, vec![u32::MAX]);
        assert_eq!(entries[0].concept_names(), vec!["X"]);
    }

    #[test]
    fn test_out_of_order_ids_are_repaired() {
        let doc = "## 1. A\n## 1. B\n## 7. C\n## 3. D\n";
        let ids: Vec<u32> = parse_document(doc).iter().map(|e| e.topic_id).collect();
        assert_eq!(ids, vec![1, 2, 7, 8]);
    }

    #[test]
    fn test_heading_variants() {
        let doc = "# 1) First\n### 2 Second ##\n## **Third**\n";
        let entries = parse_document(doc);
        // Both headings are deeper than `# 1)` so they are concepts of topic 1
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].concept_names(), vec!["2 Second", "Third"]);

        let doc = "## 1) First\n## 2 Second ##\n## 3. **Third**\n";
        let titles: Vec<String> = parse_document(doc).into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_deeper_heading_starts_concept() {
        let doc = "## 4. Subqueries\n### EXISTS\nTrue when rows exist.\n### IN\n";
        let entries = parse_document(doc);
        assert_eq!(entries[0].concept_names(), vec!["EXISTS", "IN"]);
        assert_eq!(entries[0].concepts[0].description, "True when rows exist.");
    }

    #[test]
    fn test_list_item_concepts_with_inline_description() {
        let doc = "## 8. Conditionals\n- **COALESCE**: first non-NULL argument\n- **NULLIF** - NULL when equal\n";
        let entries = parse_document(doc);
        let concepts = &entries[0].concepts;
        assert_eq!(concepts[0].name, "COALESCE");
        assert_eq!(concepts[0].description, "first non-NULL argument");
        assert_eq!(concepts[1].name, "NULLIF");
        assert_eq!(concepts[1].description, "NULL when equal");
    }

    #[test]
    fn test_bold_name_with_colon_inside() {
        let doc = "## 1. A\n**COUNT(*):** counts rows\n";
        let concept = &parse_document(doc)[0].concepts[0];
        assert_eq!(concept.name, "COUNT(*)");
        assert_eq!(concept.description, "counts rows");
    }

    #[test]
    fn test_hint_forms() {
        let doc = "## 1. Hints\n**A**\n> Tip: prefer EXISTS\n**B**\n**Hint:** avoid wildcard selects\n**C**\n- Use case: reporting\nUse it when\n";
        let entries = parse_document(doc);
        let hints: Vec<Option<&str>> = entries[0]
            .concepts
            .iter()
            .map(|c| c.usage_hint.as_deref())
            .collect();
        assert_eq!(
            hints,
            vec![
                Some("prefer EXISTS"),
                Some("avoid wildcard selects"),
                Some("reporting Use it when")
            ]
        );
    }

    #[test]
    fn test_hint_before_any_concept_is_summary() {
        let doc = "## 1. A\nTip: read the docs\n";
        let entries = parse_document(doc);
        assert_eq!(entries[0].summary, "Tip: read the docs");
        assert!(entries[0].concepts.is_empty());
    }

    #[test]
    fn test_code_before_first_concept_gets_overview_concept() {
        let doc = "## 5. CTEs\nIntro.\n```sql\nWITH x AS (SELECT 1) SELECT * FROM x;\n```\nAfter code.\n**WITH**\n";
        let entries = parse_document(doc);
        let entry = &entries[0];
        assert_eq!(entry.summary, "Intro.");
        assert_eq!(entry.concept_names(), vec!["CTEs", "WITH"]);
        assert_eq!(entry.concepts[0].examples.len(), 1);
        assert_eq!(entry.concepts[0].description, "After code.");
    }

    #[test]
    fn test_unnumbered_heading_closes_topic() {
        let doc = "## 1. A\n**X**\ntext\n## Further Reading\n**Y**\nignored\n## 2. B\n";
        let entries = parse_document(doc);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].concept_names(), vec!["X"]);
        assert_eq!(entries[1].title, "B");
        assert!(entries[1].concepts.is_empty());
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let doc = "## 1. A\n**X**\n```sql\nSELECT 1;\n## 2. B\n";
        let entries = parse_document(doc);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].concepts[0].examples, vec!["SELECT 1;\n## 2. B"]);
    }

    #[test]
    fn test_indented_fence_and_tilde_fence() {
        let doc = "## 1. A\n**X**\n  ```sql\n  SELECT a,\n      b\n  FROM t;\n  ```\n~~~\n\nSELECT 2;\n\n~~~\n";
        let examples = &parse_document(doc)[0].concepts[0].examples;
        assert_eq!(examples[0], "SELECT a,\n    b\nFROM t;");
        assert_eq!(examples[1], "SELECT 2;");
    }

    #[test]
    fn test_examples_with_both_fence_kinds_survive_rendering() {
        let doc = "## 1. A\n**X**\n````sql\nSELECT 1;\n```\n~~~\nSELECT 2;\n````\n";
        let entries = parse_document(doc);
        assert_eq!(
            entries[0].concepts[0].examples,
            vec!["SELECT 1;\n```\n~~~\nSELECT 2;".to_string()]
        );

        let reparsed = parse_document(&crate::catalog::render_document(&entries));
        assert_eq!(reparsed, entries);
    }

    #[test]
    fn test_hint_with_sql_wildcard_survives_rendering() {
        let doc = "## 1. A\n**SELECT**\nPicks columns.\nTip: avoid SELECT *\n";
        let entries = parse_document(doc);
        assert_eq!(
            entries[0].concepts[0].usage_hint.as_deref(),
            Some("avoid SELECT *")
        );

        let reparsed = parse_document(&crate::catalog::render_document(&entries));
        assert_eq!(reparsed, entries);
    }

    #[test]
    fn test_empty_fence_is_dropped() {
        let doc = "## 1. A\n**X**\n```\n\n```\n";
        assert!(parse_document(doc)[0].concepts[0].examples.is_empty());
    }

    #[test]
    fn test_crlf_and_thematic_breaks() {
        let doc = "## 1. A\r\n**X**\r\nline\r\n---\r\n* * *\r\n```sql\r\nSELECT 1;\r\n```\r\n";
        let concept = &parse_document(doc)[0].concepts[0];
        assert_eq!(concept.description, "line");
        assert_eq!(concept.examples, vec!["SELECT 1;"]);
    }

    #[test]
    fn test_usage_hint_helper() {
        assert_eq!(
            usage_hint("*Use when paginating results.*").as_deref(),
            Some("Use when paginating results.")
        );
        assert_eq!(usage_hint("USAGE: nightly jobs").as_deref(), Some("nightly jobs"));
        assert_eq!(usage_hint("Hint:"), None);
        assert_eq!(
            usage_hint("Tip: avoid SELECT *").as_deref(),
            Some("avoid SELECT *")
        );
        assert_eq!(
            usage_hint("*Hint: use COUNT(*) over **COUNT(col)**, not SELECT **").as_deref(),
            Some("use COUNT(*) over **COUNT(col)**, not SELECT *")
        );
        assert_eq!(
            usage_hint("**Tip**: index the join key").as_deref(),
            Some("index the join key")
        );
        assert_eq!(usage_hint("_Use when sorting_").as_deref(), Some("Use when sorting"));
        assert_eq!(usage_hint("Users table"), None);
    }
}

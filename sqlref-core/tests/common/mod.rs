//! Test helper functions for integration tests
//!
//! Shared across test files using the tests/common/ pattern.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::sync::Once;

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// A document with `topics` numbered sections, each holding `concepts_per_topic`
/// concepts named `T<topic>C<concept>` with one example each
pub fn generated_document(topics: usize, concepts_per_topic: usize) -> String {
    let mut doc = String::from("# Generated Cheat Sheet\n\nPreamble prose.\n\n");
    for topic in 1..=topics {
        let _ = writeln!(doc, "## {topic}. Topic number {topic}\n");
        let _ = writeln!(doc, "Summary for topic {topic}.\n");
        for concept in 1..=concepts_per_topic {
            let _ = writeln!(doc, "**T{topic}C{concept}**");
            let _ = writeln!(doc, "Description of concept {concept} in topic {topic}.");
            let _ = writeln!(doc, "```sql\nSELECT {concept} FROM topic_{topic};\n```");
            let _ = writeln!(doc, "*Use when testing topic {topic}.*\n");
        }
    }
    doc
}

/// A small joins-only document used across tests
pub const JOINS_DOCUMENT: &str = r#"# Joins primer

## 1. Joins

**INNER JOIN**
Only rows matching on both sides.
```sql
SELECT * FROM a INNER JOIN b ON a.id = b.a_id;
```

**LEFT JOIN**
All rows from the left table.
```sql
SELECT * FROM a LEFT JOIN b ON a.id = b.a_id;
```
*Use when the left side must be complete.*

**RIGHT JOIN**
All rows from the right table.

**FULL OUTER JOIN**
All rows from both tables.
```sql
SELECT * FROM a FULL OUTER JOIN b ON a.id = b.a_id;
```

**SELF JOIN**
A table joined with itself.
```sql
SELECT e.name, m.name FROM emp e JOIN emp m ON e.manager_id = m.id;
```
"#;

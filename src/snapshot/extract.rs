//! Schema Extractor
//!
//! Reads the comment-embedded schema declarations out of a notebook's source:
//!
//! ```text
//! # SCHEMA: customers
//! # COLUMNS: customer_id (string), email (string, nullable), lifetime_value (double)
//! ```
//!
//! Only these two marker lines matter; the rest of the notebook is ignored.

use crate::schema::{ColumnSpec, SchemaSnapshot};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

const SCHEMA_MARKER: &str = "# SCHEMA:";
const COLUMNS_MARKER: &str = "# COLUMNS:";

/// Column name up to the opening parenthesis of its type group
static COLUMN_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^()]*)\(").expect("column pattern is valid"));

/// Nullability keyword, including negated spellings so they stay out of the type
static NULLABLE_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\bnon[\s_-]*|\bnot[\s_-]+)?nullable").expect("nullable pattern is valid")
});

pub struct SchemaExtractor;

impl SchemaExtractor {
    /// Parse every declared table out of `source`. An empty snapshot means the
    /// notebook declares nothing.
    pub fn extract(source: &str) -> SchemaSnapshot {
        let mut snapshot = SchemaSnapshot::new();
        let mut current_table: Option<String> = None;

        for line in source.lines() {
            if let Some(rest) = marker_remainder(line, SCHEMA_MARKER) {
                let name = rest.trim();
                if name.is_empty() {
                    current_table = None;
                    continue;
                }
                snapshot.reset_table(name);
                current_table = Some(name.to_string());
            } else if let Some(rest) = marker_remainder(line, COLUMNS_MARKER) {
                let Some(table) = current_table.as_deref() else {
                    debug!("Ignoring COLUMNS declaration outside of a SCHEMA block");
                    continue;
                };
                for fragment in split_top_level(rest) {
                    if let Some((name, spec)) = parse_column(fragment) {
                        snapshot.insert_column(table, name, spec);
                    }
                }
            }
        }

        debug!(
            "Extracted {} tables, {} columns",
            snapshot.table_count(),
            snapshot.column_count()
        );
        snapshot
    }
}

fn marker_remainder<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.find(marker).map(|idx| &line[idx + marker.len()..])
}

/// Split on commas that are not inside parentheses
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (idx, ch) in input.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Text between `input[0] == '('` and its matching `)`
fn balanced_group(input: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (idx, ch) in input.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&input[1..idx]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_column(fragment: &str) -> Option<(String, ColumnSpec)> {
    let fragment = fragment.trim();
    let caps = COLUMN_DECL.captures(fragment)?;
    let name = caps[1].trim();
    let open = caps.get(0)?.end() - 1;
    let inner = balanced_group(&fragment[open..])?;

    let nullable = inner.to_lowercase().contains("nullable");

    // Commas nested in the type, as in `decimal(10,2)`, belong to the type
    let type_part = split_top_level(inner).into_iter().next().unwrap_or_default();
    let type_part = match NULLABLE_KEYWORD.find(type_part) {
        Some(m) => &type_part[..m.start()],
        None => type_part,
    };
    let data_type = type_part.trim();

    if name.is_empty() || data_type.is_empty() {
        debug!("Skipping malformed column declaration: {:?}", fragment);
        return None;
    }

    Some((name.to_string(), ColumnSpec::new(data_type, nullable)))
}

//! Schema Diff Engine
//!
//! Compares the baseline snapshot with the freshly extracted one and classifies
//! every column-level difference as breaking or safe for downstream reports.

use crate::schema::{SchemaSnapshot, TableSchema};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Kind of schema change detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    ColumnRemoved,
    ColumnAdded,
    /// Part of the taxonomy only: a rename is reported as a removal plus an addition
    #[allow(dead_code)]
    ColumnRenamed,
    #[serde(rename = "data_type_changed")]
    TypeChanged,
    #[serde(rename = "column_made_nullable")]
    MadeNullable,
    #[serde(rename = "column_made_non_nullable")]
    MadeNonNullable,
}

impl ChangeKind {
    pub fn severity(self) -> Severity {
        match self {
            ChangeKind::ColumnRemoved
            | ChangeKind::ColumnRenamed
            | ChangeKind::TypeChanged
            | ChangeKind::MadeNullable => Severity::Breaking,
            ChangeKind::ColumnAdded | ChangeKind::MadeNonNullable => Severity::Safe,
        }
    }
}

/// Whether a change can break a downstream consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Breaking,
    Safe,
}

/// A single detected change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub severity: Severity,
    pub table: String,
    pub column: String,
    pub message: String,
}

impl SchemaChange {
    fn new(kind: ChangeKind, table: &str, column: &str, message: String) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            table: table.to_string(),
            column: column.to_string(),
            message,
        }
    }

    pub fn is_breaking(&self) -> bool {
        self.severity == Severity::Breaking
    }
}

/// Summary statistics for the diff
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub tables_affected: usize,
    pub columns_added: usize,
    pub columns_removed: usize,
    pub types_changed: usize,
    pub made_nullable: usize,
    pub made_non_nullable: usize,
    pub breaking: usize,
    pub safe: usize,
    pub total_changes: usize,
}

/// Complete schema diff result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDiff {
    pub changes: Vec<SchemaChange>,
    pub summary: DiffSummary,
    pub has_breaking_changes: bool,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn breaking(&self) -> impl Iterator<Item = &SchemaChange> {
        self.changes.iter().filter(|c| c.is_breaking())
    }

    pub fn safe(&self) -> impl Iterator<Item = &SchemaChange> {
        self.changes.iter().filter(|c| !c.is_breaking())
    }
}

/// The diff engine that compares schema snapshots
pub struct DiffEngine;

impl DiffEngine {
    /// Compare two schema snapshots and return all differences
    pub fn diff(previous: &SchemaSnapshot, current: &SchemaSnapshot) -> SchemaDiff {
        let empty = TableSchema::default();
        let mut changes = Vec::new();

        let table_names: BTreeSet<&str> = previous
            .tables()
            .chain(current.tables())
            .map(|(name, _)| name)
            .collect();

        for table_name in table_names {
            let from = previous.table(table_name).unwrap_or(&empty);
            let to = current.table(table_name).unwrap_or(&empty);
            Self::diff_columns(table_name, from, to, &mut changes);
        }

        let summary = Self::calculate_summary(&changes);
        let has_breaking_changes = changes.iter().any(|c| c.is_breaking());

        SchemaDiff {
            changes,
            summary,
            has_breaking_changes,
        }
    }

    fn diff_columns(
        table: &str,
        from: &TableSchema,
        to: &TableSchema,
        changes: &mut Vec<SchemaChange>,
    ) {
        // Detect removed columns
        for col_name in from.columns.keys() {
            if !to.columns.contains_key(col_name) {
                changes.push(SchemaChange::new(
                    ChangeKind::ColumnRemoved,
                    table,
                    col_name,
                    format!("Column '{}' was removed from table '{}'", col_name, table),
                ));
            }
        }

        // Detect added columns
        for col_name in to.columns.keys() {
            if !from.columns.contains_key(col_name) {
                changes.push(SchemaChange::new(
                    ChangeKind::ColumnAdded,
                    table,
                    col_name,
                    format!("Column '{}' was added to table '{}'", col_name, table),
                ));
            }
        }

        // Type changes: exact string comparison, no synonym handling
        for (col_name, old) in &from.columns {
            let Some(new) = to.column(col_name) else {
                continue;
            };
            if old.data_type != new.data_type {
                changes.push(SchemaChange::new(
                    ChangeKind::TypeChanged,
                    table,
                    col_name,
                    format!(
                        "Column '{}' type changed from {} to {}",
                        col_name, old.data_type, new.data_type
                    ),
                ));
            }
        }

        // Nullability changes
        for (col_name, old) in &from.columns {
            let Some(new) = to.column(col_name) else {
                continue;
            };
            match (old.nullable, new.nullable) {
                (false, true) => changes.push(SchemaChange::new(
                    ChangeKind::MadeNullable,
                    table,
                    col_name,
                    format!("Column '{}' changed from non-nullable to nullable", col_name),
                )),
                (true, false) => changes.push(SchemaChange::new(
                    ChangeKind::MadeNonNullable,
                    table,
                    col_name,
                    format!("Column '{}' changed from nullable to non-nullable", col_name),
                )),
                _ => {}
            }
        }
    }

    fn calculate_summary(changes: &[SchemaChange]) -> DiffSummary {
        let mut summary = DiffSummary {
            total_changes: changes.len(),
            ..DiffSummary::default()
        };
        let mut tables: HashSet<&str> = HashSet::new();

        for change in changes {
            tables.insert(change.table.as_str());
            match change.kind {
                ChangeKind::ColumnAdded => summary.columns_added += 1,
                ChangeKind::ColumnRemoved => summary.columns_removed += 1,
                ChangeKind::TypeChanged => summary.types_changed += 1,
                ChangeKind::MadeNullable => summary.made_nullable += 1,
                ChangeKind::MadeNonNullable => summary.made_non_nullable += 1,
                ChangeKind::ColumnRenamed => {}
            }
            match change.severity {
                Severity::Breaking => summary.breaking += 1,
                Severity::Safe => summary.safe += 1,
            }
        }

        summary.tables_affected = tables.len();
        summary
    }
}

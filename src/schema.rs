//! Declared Schema Model
//!
//! Types describing the tables a notebook declares it writes. The serde shape
//! of [`SchemaSnapshot`] is exactly the baseline file format:
//!
//! ```json
//! { "customers": { "columns": { "id": { "type": "string", "nullable": false } } } }
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// A single declared column. The column name is the key in its table's map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
}

impl ColumnSpec {
    pub fn new(data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            data_type: data_type.into(),
            nullable,
        }
    }
}

/// Columns of one declared table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnSpec>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.get(name)
    }
}

/// Complete declared schema of one notebook revision (table name -> table)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaSnapshot {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(|t| t.columns.len()).sum()
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    /// Tables in name order
    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableSchema)> {
        self.tables.iter().map(|(name, table)| (name.as_str(), table))
    }

    /// Start a fresh, empty entry for `name`, discarding any earlier declaration
    pub fn reset_table(&mut self, name: impl Into<String>) -> &mut TableSchema {
        let slot = self.tables.entry(name.into()).or_default();
        *slot = TableSchema::default();
        slot
    }

    /// Insert or replace a column, creating the table entry if needed
    pub fn insert_column(
        &mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        spec: ColumnSpec,
    ) {
        self.tables
            .entry(table.into())
            .or_default()
            .columns
            .insert(column.into(), spec);
    }

    /// Compute checksum from schema content
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();

        // BTreeMap iteration keeps this stable across runs
        for (table_name, table) in &self.tables {
            hasher.update(format!("T:{}\n", table_name).as_bytes());
            for (col_name, col) in &table.columns {
                hasher.update(
                    format!("C:{}.{}:{}:{}\n", table_name, col_name, col.data_type, col.nullable)
                        .as_bytes(),
                );
            }
        }

        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_baseline_json_shape() {
        let mut snapshot = SchemaSnapshot::new();
        snapshot.insert_column("customers", "id", ColumnSpec::new("string", false));

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "customers": { "columns": { "id": { "type": "string", "nullable": false } } }
            })
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let snapshot: SchemaSnapshot =
            serde_json::from_str(r#"{"orders": {"columns": {"total": {"type": "double"}}}, "empty": {}}"#)
                .unwrap();

        let orders = snapshot.table("orders").unwrap();
        assert_eq!(orders.column("total"), Some(&ColumnSpec::new("double", false)));
        assert!(snapshot.table("empty").unwrap().columns.is_empty());
    }

    #[test]
    fn test_reset_table_discards_columns() {
        let mut snapshot = SchemaSnapshot::new();
        snapshot.insert_column("t", "a", ColumnSpec::new("int", false));
        snapshot.reset_table("t");

        assert_eq!(snapshot.table_count(), 1);
        assert_eq!(snapshot.column_count(), 0);
    }

    #[test]
    fn test_checksum_consistency() {
        let mut a = SchemaSnapshot::new();
        a.insert_column("t", "x", ColumnSpec::new("int", false));
        a.insert_column("t", "y", ColumnSpec::new("string", true));

        let mut b = SchemaSnapshot::new();
        b.insert_column("t", "y", ColumnSpec::new("string", true));
        b.insert_column("t", "x", ColumnSpec::new("int", false));

        assert_eq!(a.checksum(), b.checksum());

        b.insert_column("t", "x", ColumnSpec::new("int", true));
        assert_ne!(a.checksum(), b.checksum());
    }
}

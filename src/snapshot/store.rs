//! Baseline Store
//!
//! Keeps the last-seen schema in a JSON side-file next to the notebook. Only
//! one snapshot is retained; every save overwrites it.

use crate::error::{AppError, AppResult};
use crate::schema::SchemaSnapshot;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Store for the baseline schema snapshot
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Baseline named `file_name` in the notebook's directory
    pub fn beside(notebook: &Path, file_name: &str) -> Self {
        let dir = notebook.parent().unwrap_or_else(|| Path::new(""));
        Self::new(dir.join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the baseline. A missing file yields an empty snapshot; malformed
    /// JSON is an error.
    pub fn load(&self) -> AppResult<SchemaSnapshot> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No baseline at {}", self.path.display());
                return Ok(SchemaSnapshot::new());
            }
            Err(e) => return Err(AppError::io(&self.path, e)),
        };

        let snapshot: SchemaSnapshot =
            serde_json::from_str(&raw).map_err(|source| AppError::BaselineParse {
                path: self.path.clone(),
                source,
            })?;

        tracing::info!(
            "Loaded baseline {}: {} tables, {} columns",
            self.path.display(),
            snapshot.table_count(),
            snapshot.column_count()
        );
        Ok(snapshot)
    }

    /// Overwrite the baseline with `snapshot` as 2-space indented JSON
    pub fn save(&self, snapshot: &SchemaSnapshot) -> AppResult<()> {
        let body = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, body).map_err(|e| AppError::io(&self.path, e))?;

        tracing::info!(
            "Saved baseline {}: {} tables (checksum {})",
            self.path.display(),
            snapshot.table_count(),
            &snapshot.checksum()[..12]
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnSpec;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_baseline_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(dir.path().join("output_schema.json"));

        assert!(!store.path().exists());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(dir.path().join("output_schema.json"));

        let mut snapshot = SchemaSnapshot::new();
        snapshot.insert_column("customers", "id", ColumnSpec::new("string", false));
        snapshot.insert_column("customers", "email", ColumnSpec::new("string", true));

        store.save(&snapshot).unwrap();
        assert!(store.path().is_file());
        assert_eq!(store.load().unwrap(), snapshot);
    }

    #[test]
    fn test_saved_file_uses_two_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(dir.path().join("output_schema.json"));

        let mut snapshot = SchemaSnapshot::new();
        snapshot.insert_column("t", "a", ColumnSpec::new("int", false));
        store.save(&snapshot).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            raw,
            "{\n  \"t\": {\n    \"columns\": {\n      \"a\": {\n        \"type\": \"int\",\n        \"nullable\": false\n      }\n    }\n  }\n}"
        );
    }

    #[test]
    fn test_malformed_baseline_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output_schema.json");
        fs::write(&path, "{ not json").unwrap();

        let result = BaselineStore::new(&path).load();
        assert!(matches!(result, Err(AppError::BaselineParse { .. })));
    }

    #[test]
    fn test_beside_resolves_next_to_notebook() {
        let store = BaselineStore::beside(
            Path::new("notebooks/model_training.Notebook/notebook-content.py"),
            "output_schema.json",
        );
        assert_eq!(
            store.path(),
            Path::new("notebooks/model_training.Notebook/output_schema.json")
        );
    }
}

//! Schema Change Detector
//!
//! Runs one detection pass for a notebook: extract the declared schema, compare
//! it with the stored baseline, then persist it as the next baseline.

use crate::error::{AppError, AppResult};
use crate::schema::SchemaSnapshot;
use crate::snapshot::{BaselineStore, DiffEngine, SchemaDiff, SchemaExtractor};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What a detection pass concluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionOutcome {
    /// The notebook declares no schema; nothing was compared or saved
    NoSchemaDeclared,
    /// No usable baseline existed; the current schema became the baseline
    BaselineSeeded { snapshot: SchemaSnapshot },
    /// Baseline and current schema were compared
    Compared {
        baseline_checksum: String,
        current_checksum: String,
        diff: SchemaDiff,
    },
}

impl DetectionOutcome {
    pub fn has_breaking_changes(&self) -> bool {
        matches!(self, DetectionOutcome::Compared { diff, .. } if diff.has_breaking_changes)
    }

    pub fn diff(&self) -> Option<&SchemaDiff> {
        match self {
            DetectionOutcome::Compared { diff, .. } => Some(diff),
            _ => None,
        }
    }

    /// Stable label used in machine-readable reports
    pub fn label(&self) -> &'static str {
        match self {
            DetectionOutcome::NoSchemaDeclared => "no_schema",
            DetectionOutcome::BaselineSeeded { .. } => "baseline_seeded",
            DetectionOutcome::Compared { diff, .. } if diff.is_empty() => "unchanged",
            DetectionOutcome::Compared { .. } => "changed",
        }
    }
}

pub struct SchemaChangeDetector {
    notebook: PathBuf,
    store: BaselineStore,
}

impl SchemaChangeDetector {
    pub fn new(notebook: impl Into<PathBuf>, store: BaselineStore) -> Self {
        Self {
            notebook: notebook.into(),
            store,
        }
    }

    pub fn notebook(&self) -> &Path {
        &self.notebook
    }

    pub fn baseline_path(&self) -> &Path {
        self.store.path()
    }

    pub fn run(&self) -> AppResult<DetectionOutcome> {
        info!("🔍 Analyzing schema changes in: {}", self.notebook.display());

        let source =
            fs::read_to_string(&self.notebook).map_err(|e| AppError::io(&self.notebook, e))?;
        let current = SchemaExtractor::extract(&source);

        if current.is_empty() {
            debug!("No SCHEMA markers in {}", self.notebook.display());
            return Ok(DetectionOutcome::NoSchemaDeclared);
        }

        let previous = self.store.load()?;

        if previous.is_empty() {
            debug!("No previous schema found, seeding baseline");
            self.store.save(&current)?;
            return Ok(DetectionOutcome::BaselineSeeded { snapshot: current });
        }

        let diff = DiffEngine::diff(&previous, &current);
        info!(
            "Compared {} baseline tables with {} current tables: {} changes ({} breaking)",
            previous.table_count(),
            current.table_count(),
            diff.summary.total_changes,
            diff.summary.breaking
        );

        // An unchanged schema leaves the stored baseline as it is
        if !diff.is_empty() {
            self.store.save(&current)?;
        }

        Ok(DetectionOutcome::Compared {
            baseline_checksum: previous.checksum(),
            current_checksum: current.checksum(),
            diff,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::diff::{ChangeKind, Severity};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        notebook: PathBuf,
        baseline: PathBuf,
    }

    impl Fixture {
        fn new(notebook_source: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let notebook_dir = dir.path().join("customers.Notebook");
            fs::create_dir_all(&notebook_dir).unwrap();
            let notebook = notebook_dir.join("notebook-content.py");
            fs::write(&notebook, notebook_source).unwrap();
            let baseline = notebook_dir.join("output_schema.json");
            Self {
                _dir: dir,
                notebook,
                baseline,
            }
        }

        fn with_baseline(self, json: &str) -> Self {
            fs::write(&self.baseline, json).unwrap();
            self
        }

        fn run(&self) -> AppResult<DetectionOutcome> {
            let store = BaselineStore::beside(&self.notebook, "output_schema.json");
            SchemaChangeDetector::new(&self.notebook, store).run()
        }

        fn stored(&self) -> SchemaSnapshot {
            BaselineStore::new(&self.baseline).load().unwrap()
        }
    }

    #[test]
    fn test_added_column_scenario() {
        let fx = Fixture::new("# SCHEMA: customers\n# COLUMNS: id (string), email (string)\n")
            .with_baseline(r#"{"customers": {"columns": {"id": {"type": "string", "nullable": false}}}}"#);

        let outcome = fx.run().unwrap();
        let diff = outcome.diff().unwrap();
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].kind, ChangeKind::ColumnAdded);
        assert_eq!(diff.changes[0].column, "email");
        assert_eq!(diff.changes[0].severity, Severity::Safe);
        assert!(!outcome.has_breaking_changes());

        assert!(fx.stored().table("customers").unwrap().column("email").is_some());
    }

    #[test]
    fn test_made_nullable_scenario() {
        let fx = Fixture::new("# SCHEMA: sales\n# COLUMNS: amount (double, nullable)\n")
            .with_baseline(r#"{"sales": {"columns": {"amount": {"type": "double", "nullable": false}}}}"#);

        let outcome = fx.run().unwrap();
        let diff = outcome.diff().unwrap();
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].kind, ChangeKind::MadeNullable);
        assert_eq!(diff.changes[0].severity, Severity::Breaking);
        assert!(outcome.has_breaking_changes());
        assert_eq!(outcome.label(), "changed");
    }

    #[test]
    fn test_removed_column_scenario() {
        let fx = Fixture::new("# SCHEMA: orders\n# COLUMNS: id (int)\n").with_baseline(
            r#"{"orders": {"columns": {"id": {"type": "int", "nullable": false}, "status": {"type": "string", "nullable": false}}}}"#,
        );

        let outcome = fx.run().unwrap();
        let diff = outcome.diff().unwrap();
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].kind, ChangeKind::ColumnRemoved);
        assert_eq!(diff.changes[0].column, "status");
        assert!(outcome.has_breaking_changes());
    }

    #[test]
    fn test_first_run_seeds_baseline() {
        let fx = Fixture::new("# SCHEMA: customers\n# COLUMNS: id (string), email (string, nullable)\n");

        let outcome = fx.run().unwrap();
        let DetectionOutcome::BaselineSeeded { snapshot } = &outcome else {
            panic!("expected baseline seeding, got {:?}", outcome);
        };
        assert!(!outcome.has_breaking_changes());
        assert_eq!(&fx.stored(), snapshot);

        // The seeded baseline is the reference for the next run
        let second = fx.run().unwrap();
        assert_eq!(second.label(), "unchanged");
    }

    #[test]
    fn test_unchanged_schema_keeps_baseline_file() {
        let baseline = r#"{"customers": {"columns": {"id": {"type": "string", "nullable": false}}}, "legacy": {"columns": {}}}"#;
        let fx = Fixture::new("# SCHEMA: customers\n# COLUMNS: id (string)\n").with_baseline(baseline);

        let outcome = fx.run().unwrap();
        assert_eq!(outcome.label(), "unchanged");
        assert_eq!(fs::read_to_string(&fx.baseline).unwrap(), baseline);
    }

    #[test]
    fn test_empty_baseline_object_seeds() {
        let fx = Fixture::new("# SCHEMA: t\n# COLUMNS: a (int)\n").with_baseline("{}");

        let outcome = fx.run().unwrap();
        assert_eq!(outcome.label(), "baseline_seeded");
        assert_eq!(fx.stored().table_count(), 1);
    }

    #[test]
    fn test_no_schema_leaves_baseline_untouched() {
        let fx = Fixture::new("print('no declarations here')\n");

        let outcome = fx.run().unwrap();
        assert_eq!(outcome, DetectionOutcome::NoSchemaDeclared);
        assert!(!fx.baseline.exists());
    }

    #[test]
    fn test_malformed_baseline_aborts_without_saving() {
        let fx = Fixture::new("# SCHEMA: t\n# COLUMNS: a (int)\n").with_baseline("[oops");

        let result = fx.run();
        assert!(matches!(result, Err(AppError::BaselineParse { .. })));
        assert_eq!(fs::read_to_string(&fx.baseline).unwrap(), "[oops");
    }

    #[test]
    fn test_missing_notebook_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let notebook = dir.path().join("absent.py");
        let store = BaselineStore::beside(&notebook, "output_schema.json");

        let result = SchemaChangeDetector::new(&notebook, store).run();
        assert!(matches!(result, Err(AppError::Io { .. })));
    }
}

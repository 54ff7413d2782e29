//! Detection reports
//!
//! Renders a [`DetectionOutcome`] for people (text) or for CI tooling (JSON).

use crate::config::ReportFormat;
use crate::detector::DetectionOutcome;
use crate::snapshot::diff::DiffSummary;
use crate::snapshot::{SchemaChange, Severity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

/// Machine-readable report body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport<'a> {
    pub notebook: String,
    pub baseline: String,
    pub outcome: &'static str,
    pub has_breaking_changes: bool,
    pub failed: bool,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<&'a DiffSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_checksum: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_checksum: Option<&'a str>,
    pub changes: &'a [SchemaChange],
}

pub struct ReportContext<'a> {
    pub notebook: &'a Path,
    pub baseline: &'a Path,
    /// Whether this run fails because of breaking changes
    pub failed: bool,
}

pub fn render(
    format: ReportFormat,
    outcome: &DetectionOutcome,
    ctx: &ReportContext<'_>,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(render_text(outcome, ctx)),
        ReportFormat::Json => render_json(outcome, ctx, Utc::now()),
    }
}

pub fn render_text(outcome: &DetectionOutcome, ctx: &ReportContext<'_>) -> String {
    let mut out = String::new();

    match outcome {
        DetectionOutcome::NoSchemaDeclared => {
            let _ = writeln!(out, "⚠️  No schema definitions found in {}", ctx.notebook.display());
            let _ = writeln!(out, "   Add schema comments like:");
            let _ = writeln!(out, "   # SCHEMA: customers");
            let _ = writeln!(out, "   # COLUMNS: customer_id (string), name (string)");
        }
        DetectionOutcome::BaselineSeeded { snapshot } => {
            let _ = writeln!(
                out,
                "ℹ️  No previous schema found. Saved {} table(s) as baseline: {}",
                snapshot.table_count(),
                ctx.baseline.display()
            );
        }
        DetectionOutcome::Compared { diff, .. } if diff.is_empty() => {
            let _ = writeln!(out, "✅ No schema changes detected");
        }
        DetectionOutcome::Compared { diff, .. } => {
            write_section(
                &mut out,
                "🚨 BREAKING CHANGES DETECTED (will break downstream reports):",
                "❌",
                diff.breaking(),
            );
            write_section(
                &mut out,
                "✅ Safe changes (won't break existing reports):",
                "✓",
                diff.safe(),
            );
            let _ = writeln!(
                out,
                "\n{} change(s): {} breaking, {} safe across {} table(s)",
                diff.summary.total_changes,
                diff.summary.breaking,
                diff.summary.safe,
                diff.summary.tables_affected
            );
        }
    }

    if ctx.failed {
        let _ = writeln!(out, "\n❌ VALIDATION FAILED: Breaking schema changes detected");
        let _ = writeln!(out, "   Downstream reports may break. Please review changes.");
    }

    out
}

fn write_section<'a>(
    out: &mut String,
    heading: &str,
    bullet: &str,
    changes: impl Iterator<Item = &'a SchemaChange>,
) {
    let mut changes = changes.peekable();
    if changes.peek().is_none() {
        return;
    }
    let _ = writeln!(out, "\n{}", heading);
    for change in changes {
        let _ = writeln!(out, "   {} {}", bullet, change.message);
    }
}

pub fn render_json(
    outcome: &DetectionOutcome,
    ctx: &ReportContext<'_>,
    generated_at: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    let (summary, baseline_checksum, current_checksum, changes) = match outcome {
        DetectionOutcome::Compared {
            baseline_checksum,
            current_checksum,
            diff,
        } => (
            Some(&diff.summary),
            Some(baseline_checksum.as_str()),
            Some(current_checksum.as_str()),
            diff.changes.as_slice(),
        ),
        _ => (None, None, None, &[][..]),
    };

    let report = JsonReport {
        notebook: ctx.notebook.display().to_string(),
        baseline: ctx.baseline.display().to_string(),
        outcome: outcome.label(),
        has_breaking_changes: changes.iter().any(|c| c.severity == Severity::Breaking),
        failed: ctx.failed,
        generated_at,
        summary,
        baseline_checksum,
        current_checksum,
        changes,
    };

    serde_json::to_string_pretty(&report)
}

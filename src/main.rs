//! Notebook Schema Guard
//!
//! CI gate that catches breaking changes in the output schema a notebook
//! declares before they reach downstream reports.
//!
//! Notebooks declare their outputs with comment markers:
//!
//! ```text
//! # SCHEMA: customers
//! # COLUMNS: customer_id (string), email (string, nullable)
//! ```
//!
//! Each run compares those declarations with `output_schema.json` next to the
//! notebook, reports what changed, and refreshes the baseline.

mod config;
mod detector;
mod error;
mod report;
mod schema;
mod snapshot;

use crate::config::{ReportFormat, Settings};
use crate::detector::{DetectionOutcome, SchemaChangeDetector};
use crate::error::AppError;
use crate::report::ReportContext;
use crate::snapshot::BaselineStore;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const EXIT_OK: u8 = 0;
const EXIT_BREAKING: u8 = 1;
const EXIT_FATAL: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "notebook-schema-guard", version, about = "Detect schema changes in notebooks")]
struct Cli {
    /// Path to the notebook source file
    #[arg(long)]
    notebook: PathBuf,

    /// Exit with an error code if breaking changes are detected
    #[arg(long)]
    fail_on_breaking: bool,

    /// Baseline file to compare against (defaults to one next to the notebook)
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum)]
    format: Option<ReportFormat>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let code = match Settings::load().map_err(AppError::from) {
        Ok(settings) => execute(cli, &settings),
        Err(e) => {
            error!("❌ failed to load configuration: {}", e);
            EXIT_FATAL
        }
    };
    ExitCode::from(code)
}

/// Run one check and map its result to a process exit code
fn execute(cli: Cli, settings: &Settings) -> u8 {
    match run(cli, settings) {
        Ok(code) => code,
        Err(e) => {
            error!("❌ {:#}", e);
            EXIT_FATAL
        }
    }
}

fn run(cli: Cli, settings: &Settings) -> anyhow::Result<u8> {
    let fail_on_breaking = cli.fail_on_breaking || settings.fail_on_breaking;
    let format = cli.format.unwrap_or(settings.report_format);
    let store = match cli.baseline {
        Some(path) => BaselineStore::new(path),
        None => BaselineStore::beside(&cli.notebook, &settings.baseline_file),
    };

    let detector = SchemaChangeDetector::new(&cli.notebook, store);
    let outcome = detector
        .run()
        .with_context(|| format!("schema detection failed for {}", cli.notebook.display()))?;

    let code = exit_code(&outcome, fail_on_breaking);
    let ctx = ReportContext {
        notebook: detector.notebook(),
        baseline: detector.baseline_path(),
        failed: code == EXIT_BREAKING,
    };
    let rendered = report::render(format, &outcome, &ctx).context("failed to render report")?;
    println!("{}", rendered.trim_end());

    match outcome.diff() {
        Some(diff) => info!(
            "Schema check finished: {} ({} breaking, {} safe)",
            outcome.label(),
            diff.summary.breaking,
            diff.summary.safe
        ),
        None => info!("Schema check finished: {}", outcome.label()),
    }
    Ok(code)
}

/// Breaking changes only fail the run when the caller opted in
fn exit_code(outcome: &DetectionOutcome, fail_on_breaking: bool) -> u8 {
    if fail_on_breaking && outcome.has_breaking_changes() {
        EXIT_BREAKING
    } else {
        EXIT_OK
    }
}

/// Initialize tracing with structured logging on stderr
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .init();
}

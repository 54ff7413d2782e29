//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_BASELINE_FILE: &str = "output_schema.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Output format of the detection report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err("expected `text` or `json`"),
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// File name of the baseline, resolved next to the notebook
    pub baseline_file: String,
    pub fail_on_breaking: bool,
    pub report_format: ReportFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            baseline_file: DEFAULT_BASELINE_FILE.to_string(),
            fail_on_breaking: false,
            report_format: ReportFormat::Text,
        }
    }
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let baseline_file = match lookup("SCHEMA_BASELINE_FILE") {
            Some(name) if name.trim().is_empty() => {
                return Err(ConfigError::InvalidValue {
                    var: "SCHEMA_BASELINE_FILE",
                    value: name,
                    reason: "must not be empty",
                })
            }
            Some(name) => name.trim().to_string(),
            None => defaults.baseline_file,
        };

        let fail_on_breaking = match lookup("SCHEMA_FAIL_ON_BREAKING") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidValue {
                var: "SCHEMA_FAIL_ON_BREAKING",
                value: raw.clone(),
                reason: "expected a boolean",
            })?,
            None => defaults.fail_on_breaking,
        };

        let report_format = match lookup("SCHEMA_REPORT_FORMAT") {
            Some(raw) => raw
                .parse::<ReportFormat>()
                .map_err(|reason| ConfigError::InvalidValue {
                    var: "SCHEMA_REPORT_FORMAT",
                    value: raw.clone(),
                    reason,
                })?,
            None => defaults.report_format,
        };

        Ok(Self {
            baseline_file,
            fail_on_breaking,
            report_format,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::ingest;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::Parser;
use std::path::PathBuf;

/// osaudit - service-order backlog auditor
///
/// Classifies a service-order backlog export, assigns each order to its
/// responsible analyst, flags offenders and writes a Markdown or JSON
/// report. Optionally asks a local Ollama model about the aggregates.
///
/// Examples:
///   osaudit --input backlog.xlsx
///   osaudit --input backlog.csv --format json --output report.json
///   osaudit --input backlog.xlsx --now 2024-01-22 --export-dir out/
///   osaudit --input backlog.xlsx --ask "Which executor is slowest?"
///   osaudit --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Backlog export to analyze (.xlsx, .xlsm, .xlsb, .xls, .ods or .csv)
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to the value in .osaudit.toml, or osaudit_report.md.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .osaudit.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Reference time for stalled days and overdue checks
    ///
    /// Accepts YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS. Defaults to the current time.
    #[arg(long, value_name = "DATE", value_parser = parse_reference_time)]
    pub now: Option<NaiveDateTime>,

    /// Also write CSV tables (records, offender buckets, performance) here
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Question for the AI assistant about the backlog aggregates
    #[arg(long, value_name = "QUESTION")]
    pub ask: Option<String>,

    /// Ollama model used by --ask
    #[arg(short, long, env = "OSAUDIT_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Assistant request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Exit with code 2 when any headline metric is critical
    ///
    /// Useful for scheduled jobs that alert on a degraded backlog.
    #[arg(long)]
    pub fail_on_critical: bool,

    /// Generate a default .osaudit.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Parse `--now` as a date (midnight) or a full datetime.
fn parse_reference_time(value: &str) -> Result<NaiveDateTime, String> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::default()));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD", value))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.input {
            Some(ref input) => {
                if !input.exists() {
                    return Err(format!("Input file does not exist: {}", input.display()));
                }
                if !input.is_file() {
                    return Err(format!("Input path is not a file: {}", input.display()));
                }
                if !ingest::is_supported(input) {
                    return Err(format!(
                        "Unsupported input format: {} (expected .xlsx, .xlsm, .xlsb, .xls, .ods or .csv)",
                        input.display()
                    ));
                }
            }
            None => return Err("An input file is required (--input)".to_string()),
        }

        // Validate Ollama URL format
        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref question) = self.ask {
            if question.trim().is_empty() {
                return Err("The --ask question cannot be empty".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

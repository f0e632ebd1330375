//! osaudit - service-order backlog auditor
//!
//! Reads a backlog export, classifies every order (stalled business days,
//! SLA status, responsible analyst), extracts offender buckets and writes
//! a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success (no critical metric, or no --fail-on-critical set)
//!   1 - Runtime error (unreadable input, bad config, write failure, etc.)
//!   2 - A headline metric is critical and --fail-on-critical was set

mod analysis;
mod assistant;
mod attribution;
mod cli;
mod config;
mod ingest;
mod models;
mod normalize;
mod offenders;
mod pipeline;
mod report;
mod summary;

use anyhow::{Context, Result};
use assistant::AssistantClient;
use chrono::{NaiveDateTime, Utc};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use models::{AssistantAnswer, Report, ReportMetadata};
use pipeline::Pipeline;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use summary::DataSummary;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("osaudit v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_audit(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Audit failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .osaudit.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize team filters, attribution rules and thresholds.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete audit workflow. Returns exit code (0 or 2).
async fn run_audit(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let input = args
        .input
        .clone()
        .context("An input file is required (--input)")?;

    // Step 1: Read the export
    if !args.quiet {
        println!("📥 Reading backlog: {}", input.display());
    }
    let rows = ingest::load_rows(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    // Every date decision in this run uses the same reference time.
    let now: NaiveDateTime = args.now.unwrap_or_else(|| Utc::now().naive_utc());
    info!("Reference time: {}", now);

    // Step 2: Classify and filter
    let classification = Pipeline::from_config(&config).run(&rows, now);
    info!(
        "{} of {} orders in scope ({} excluded by team/analyst filters)",
        classification.records.len(),
        classification.unfiltered.len(),
        classification.excluded_count()
    );

    // Step 3: Aggregate
    let analysis = analysis::analyze(&classification, &config);
    let summary = DataSummary::build(analysis.records);

    // Step 4: Optional assistant question
    let assistant = match args.ask {
        Some(ref question) => ask_assistant(&config, &summary, question, args.quiet).await,
        None => None,
    };

    // Step 5: Build the report
    let duration = start_time.elapsed().as_secs_f64();
    let metadata = ReportMetadata {
        source_file: input.display().to_string(),
        reference_time: now,
        generated_at: Utc::now(),
        rows_read: analysis.rows_read,
        records_in_scope: analysis.records.len(),
        duration_seconds: duration,
    };

    let report = Report {
        metadata,
        analysis,
        summary,
        assistant,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if let Some(ref dir) = args.export_dir {
        let written = report::export_csv(&report.analysis, dir)?;
        info!("Wrote {} CSV files to {}", written.len(), dir.display());
    }

    if !args.quiet {
        print_summary(&report, &output_path);
    }

    // Check --fail-on-critical
    if args.fail_on_critical && report.analysis.has_critical_metric() {
        eprintln!("\n⛔ Critical backlog metrics found. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Ask the assistant a question. Failures are reported but never abort the run.
async fn ask_assistant(
    config: &Config,
    summary: &DataSummary,
    question: &str,
    quiet: bool,
) -> Option<AssistantAnswer> {
    let client = match AssistantClient::new(config.assistant.clone()) {
        Ok(client) => client,
        Err(e) => {
            warn!("Assistant unavailable: {:#}", e);
            return None;
        }
    };

    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Asking {}...", client.model()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let prompt = summary.to_prompt(question);
    let result = client.ask(&prompt).await;
    spinner.finish_and_clear();

    match result {
        Ok(answer) => Some(AssistantAnswer {
            model: client.model().to_string(),
            question: question.trim().to_string(),
            answer,
        }),
        Err(e) => {
            warn!("Assistant request failed: {:#}", e);
            if !quiet {
                eprintln!("⚠️  The assistant could not answer; the report omits that section.");
            }
            None
        }
    }
}

/// Print the console summary.
fn print_summary(report: &Report<'_>, output_path: &Path) {
    let analysis = &report.analysis;

    println!("\n📊 Backlog Summary:");
    println!(
        "   Orders in scope: {} of {} rows",
        report.metadata.records_in_scope, report.metadata.rows_read
    );
    println!("   Within SLA: {}", report.summary.overall.sla_label());
    for metric in &analysis.metrics {
        println!(
            "   {} {}: {}",
            metric.level.emoji(),
            metric.title,
            metric.value
        );
    }
    println!("   Duration: {:.1}s", report.metadata.duration_seconds);
    println!(
        "\n✅ Audit complete! Report saved to: {}",
        output_path.display()
    );
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

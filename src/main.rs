//! Evtriage: event-log forensic triage
//!
//! Classifies decoded Windows event-log records into forensic categories,
//! correlates removable-storage device identities, and renders a triage
//! report with optional CSV exports.

use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use clap::Parser;
use std::path::PathBuf;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use evtriage::config::AppConfig;
use evtriage::report;
use evtriage::service;
use evtriage::source::TimeWindow;

#[derive(Parser)]
#[command(name = "evtriage")]
#[command(about = "Forensic triage for decoded Windows event-log records", long_about = None)]
struct Cli {
    /// Decoded record sources, one JSON record per line
    #[arg(required = true, value_name = "SOURCE")]
    sources: Vec<PathBuf>,

    /// Only include records at or after this timestamp (UTC, e.g. 2025-11-19T23:36:08)
    #[arg(long, value_name = "TIMESTAMP")]
    from: Option<NaiveDateTime>,

    /// Only include records at or before this timestamp (UTC)
    #[arg(long, value_name = "TIMESTAMP")]
    to: Option<NaiveDateTime>,

    /// Write the two CSV reports into this directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Override logging level (e.g., error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

/// Initialize the logging pipeline.
/// Returns a WorkerGuard that MUST be kept alive for the duration of the
/// program. Diagnostics go to a rolling file and (optionally) stderr; stdout
/// stays clean for the report.
fn init_logging(cfg: &AppConfig) -> tracing_appender::non_blocking::WorkerGuard {
    if let Err(err) = std::fs::create_dir_all(&cfg.logging.directory) {
        eprintln!(
            "Failed to create log directory {:?}: {}",
            cfg.logging.directory, err
        );
    }

    let app_file = rolling::daily(&cfg.logging.directory, &cfg.logging.filename);
    let (app_writer, app_guard) = tracing_appender::non_blocking(app_file);

    let app_layer = fmt::layer()
        .with_writer(app_writer)
        .compact()
        .with_ansi(false)
        .with_target(true)
        .with_filter(EnvFilter::new(&cfg.logging.level));

    let console_layer = if cfg.logging.console_output {
        Some(
            fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_target(false)
                .with_filter(EnvFilter::new(&cfg.logging.level)),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(app_layer)
        .with(console_layer)
        .init();

    app_guard
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let (Some(from), Some(to)) = (cli.from, cli.to) {
        if to < from {
            bail!("end time must be after start time");
        }
    }

    let mut cfg = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("Failed to load configuration: {}", err);
            eprintln!("Hint: check evtriage.toml and TRIAGE__* environment overrides.");
            return Err(anyhow::anyhow!("Failed to load configuration: {}", err));
        }
    };
    if let Some(level) = cli.log_level {
        if !level.trim().is_empty() {
            cfg.logging.level = level;
        }
    }

    let _guard = init_logging(&cfg);

    let window = TimeWindow::new(
        cli.from.map(|t| t.and_utc()),
        cli.to.map(|t| t.and_utc()),
    );

    info!(sources = cli.sources.len(), "starting analysis");

    let runtime = Builder::new_multi_thread().enable_all().build()?;
    let result = runtime.block_on(service::run_analysis(cli.sources, window))?;

    println!("{}", result.report);

    if let Some(dir) = &cli.output {
        // Best-effort side channel: a failed export never fails the run.
        let written = std::fs::create_dir_all(dir)
            .map_err(anyhow::Error::from)
            .and_then(|()| report::export::write_csv_reports(dir, &cfg.export, &result));
        match written {
            Ok(()) => info!(dir = %dir.display(), "CSV reports written"),
            Err(err) => warn!(dir = %dir.display(), error = %err, "CSV export failed"),
        }
    }

    Ok(())
}

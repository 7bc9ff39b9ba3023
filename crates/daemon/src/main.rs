// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! dropwatch daemon (dwd)
//!
//! Polls the configured drop locations on their schedules until SIGTERM or
//! SIGINT, then drains in-flight checks and exits.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod lifecycle;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use dw_core::ScheduleEvaluator;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::config::{DaemonConfig, CONFIG_ENV, DEFAULT_CONFIG};
use crate::lifecycle::LifecycleError;

#[derive(Debug, Parser)]
#[command(
    name = "dwd",
    version,
    about = "dropwatch - scheduled file-arrival checks for FTP, HTTPS and object storage"
)]
struct Cli {
    /// Validate CONFIG and show when each configuration fires next, then exit
    #[arg(long)]
    check: bool,

    /// Configuration file
    #[arg(env = CONFIG_ENV, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Usage errors exit with status 2
    let cli = Cli::parse();

    let result = if cli.check {
        check(&cli.config)
    } else {
        run(&cli.config).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Validate a config file and print when each configuration fires next
fn check(path: &Path) -> Result<(), LifecycleError> {
    let config = DaemonConfig::load(path)?;
    let warnings = config.validate()?;
    for warning in &warnings {
        eprintln!("warning: {warning}");
    }

    let evaluator = ScheduleEvaluator::new();
    let now = Utc::now();
    for configuration in &config.configurations {
        let next = configuration
            .zone()
            .and_then(|zone| evaluator.compute_next(&configuration.schedule_expression, zone, now))
            .map_err(|e| {
                LifecycleError::Invalid(vec![format!("configuration {}: {e}", configuration.id)])
            })?;
        let state = if configuration.is_active { "" } else { " (inactive)" };
        println!(
            "{}\t{}\t{}\tnext {}{}",
            configuration.id,
            configuration.protocol,
            configuration.connection.host,
            next.to_rfc3339(),
            state
        );
    }
    println!(
        "ok: {} configurations, {} warnings",
        config.configurations.len(),
        warnings.len()
    );
    Ok(())
}

async fn run(path: &Path) -> Result<(), LifecycleError> {
    let config = DaemonConfig::load(path)?;

    // Write startup marker to log (before tracing setup, so it comes first)
    if let Some(log_path) = &config.daemon.log_path {
        write_startup_marker(log_path)?;
    }
    let _log_guard = setup_logging(config.daemon.log_path.as_deref())?;

    info!("Starting dwd with config {}", path.display());

    let daemon = match lifecycle::startup(config).await {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            return Err(e);
        }
    };

    // Set up signal handlers
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let handle = daemon.start()?;
    info!(
        configurations = daemon.config.configurations.len(),
        holder = %daemon.scheduler.holder(),
        "Daemon ready"
    );

    // Signal ready for a supervising process
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }

    daemon.shutdown(handle).await?;
    info!("Daemon stopped");
    Ok(())
}

/// Startup marker prefix written to the log before anything else.
/// Full format: "--- dwd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- dwd: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(log_path: &Path) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

fn setup_logging(
    log_path: Option<&Path>,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (non_blocking, guard) = match log_path {
        Some(path) => {
            let dir = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir,
                _ => Path::new("."),
            };
            let file_name = path
                .file_name()
                .ok_or_else(|| LifecycleError::BadLogPath(path.to_path_buf()))?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(log_path.is_none()))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

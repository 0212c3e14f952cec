//! Tracing setup for the `tasklog` binary.
//!
//! Capture, report and export events are written to the systemd journal when
//! one is reachable on Linux. Elsewhere, or without a journal, they go to
//! `tasklog.log.<date>` files under [`default_log_dir`], one file per day.
//! The level comes from `TASKLOG_LOG` and defaults to `info`.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_ENV: &str = "TASKLOG_LOG";
const LOG_FILE_PREFIX: &str = "tasklog.log";

/// `<data_local_dir>/tasklog/logs`, or `./tasklog/logs` without a home.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tasklog")
        .join("logs")
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Call once, before the first event.
///
/// Returns the file writer's guard when logging to files. Keep it alive for
/// the whole run: lines still buffered when it drops are flushed, lines
/// logged after that are lost.
pub fn init(log_dir: Option<PathBuf>) -> Result<Option<WorkerGuard>> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(journald) = tracing_journald::layer() {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(journald.with_syslog_identifier("tasklog".to_string()))
                .try_init()
                .context("Logging is already initialized")?;
            tracing::debug!("Logging to journald");
            return Ok(None);
        }
    }

    let log_dir = log_dir.unwrap_or_else(default_log_dir);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX));
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("Logging is already initialized")?;

    tracing::debug!(dir = %log_dir.display(), "Logging to daily files");
    Ok(Some(guard))
}

//! Logging to stderr and, optionally, to a per-run file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Keeps the file writer alive; logs written after drop are lost.
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the default `info` level. With `to_file`, events are
/// also appended to `xtask.log` under the platform cache directory.
pub fn init(to_file: bool) -> Result<LoggingGuard> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter());

    if !to_file {
        tracing_subscriber::registry().with(stderr_layer).init();
        return Ok(LoggingGuard { _file: None });
    }

    let log_dir = crate::dirs::log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        &log_dir,
        "xtask.log",
    ));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter());

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    let log_file: PathBuf = log_dir.join("xtask.log");
    tracing::info!(file = %log_file.display(), "file logging enabled");
    Ok(LoggingGuard { _file: Some(guard) })
}

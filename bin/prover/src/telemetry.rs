//! Tracing initialization: filtered stdout plus a non-blocking log file.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. The returned guard must be held for the
/// process lifetime so buffered file output is flushed on shutdown.
pub fn init(log_level: &str, log_file: &str) -> Result<WorkerGuard> {
    let path = Path::new(log_file);
    let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path.file_name().context("log file has no file name")?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_new(log_level)
        .with_context(|| format!("invalid log level `{log_level}`"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("failed installing tracing subscriber")?;
    Ok(guard)
}

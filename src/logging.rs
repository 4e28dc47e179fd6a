//! Logging setup
//!
//! JSON logs to stdout, optionally mirrored to a daily-rolling file. The
//! filter comes from `RUST_LOG` when set, otherwise from the configured
//! log level.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Default filter directives appended to the configured level
const NOISY_CRATES: &str = "hyper=warn,reqwest=warn";

/// Build the filter for one output
pub fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},{}", log_level, NOISY_CRATES)))
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop and must live as long
/// as the process logs.
pub fn init_tracing(log_level: &str, log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let console_layer = fmt::layer().json().with_filter(build_filter(log_level));
    let subscriber = tracing_subscriber::registry().with(console_layer);

    let Some(path) = log_file else {
        subscriber.try_init()?;
        return Ok(None);
    };

    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no file name: {}", path.display()))?;

    std::fs::create_dir_all(directory)?;
    let appender = tracing_appender::rolling::daily(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(build_filter(log_level));

    subscriber.with(file_layer).try_init()?;

    eprintln!("Logging to file: {} (daily rotation)", path.display());

    Ok(Some(guard))
}

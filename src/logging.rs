//! Logging setup for HiveMind using tracing.
//!
//! Console output goes to stderr so command output on stdout stays clean.
//! A daily rolling file keeps the history of timer-driven runs.

use anyhow::Result;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Overrides the log directory.
pub const LOG_DIR_ENV: &str = "HIVEMIND_LOG_DIR";

/// `json` switches the file layer to one JSON object per line.
pub const LOG_FORMAT_ENV: &str = "HIVEMIND_LOG_FORMAT";

const LOG_FILE_PREFIX: &str = "hivemind.log";
const DEFAULT_FILTER: &str = "info,hivemind=debug";

/// Where and how the file layer writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    pub dir: PathBuf,
    pub json: bool,
}

impl LogOptions {
    /// Read options from the environment, falling back to the platform data dir.
    pub fn from_env() -> Result<Self> {
        let dir = match std::env::var(LOG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => directories::ProjectDirs::from("com", "fortress", "hivemind")
                .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
                .data_dir()
                .join("logs"),
        };
        let json = std::env::var(LOG_FORMAT_ENV)
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self { dir, json })
    }
}

/// Initialize logging from the environment.
///
/// Hold the returned guard until exit; dropping it stops the file writer.
pub fn init() -> Result<(WorkerGuard, PathBuf)> {
    let options = LogOptions::from_env()?;
    let guard = init_with(&options)?;
    Ok((guard, options.dir))
}

pub fn init_with(options: &LogOptions) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&options.dir)?;

    let file_appender = tracing_appender::rolling::daily(&options.dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = if options.json {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_current_span(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    tracing::debug!("Log directory: {}", options.dir.display());
    Ok(guard)
}

/// Initialize logging for tests (captured output, no file).
#[cfg(test)]
pub fn init_test() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_test_writer())
        .try_init();
}

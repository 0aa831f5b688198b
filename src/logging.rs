//! File logging.
//!
//! The terminal belongs to the UI, so log output goes to a file instead of
//! stdout/stderr. `RUST_LOG` overrides the configured level.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Where and how verbosely to log.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub log_dir: PathBuf,
    pub file_name: String,
}

impl LoggingConfig {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            level: Level::INFO,
            log_dir: log_dir.into(),
            file_name: "shiftdesk.log".to_string(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.log_dir.join(&self.file_name)
    }

    fn default_directive(&self) -> String {
        format!(
            "{}={}",
            env!("CARGO_PKG_NAME"),
            self.level.as_str().to_ascii_lowercase()
        )
    }
}

/// Installs the global subscriber.
///
/// Keep the returned guard alive for the life of the program; dropping it
/// flushes and closes the log file.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    ensure_dir(&config.log_dir)?;

    let appender = tracing_appender::rolling::never(&config.log_dir, &config.file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("cannot install log subscriber: {e}"))?;

    info!(path = %config.path().display(), "logging started");
    Ok(guard)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))
}

//! Runtime configuration, read from the environment.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

const API_BASE_VAR: &str = "SHIFTDESK_API_BASE";
const TIMEOUT_VAR: &str = "SHIFTDESK_TIMEOUT_SECS";
const UPLOAD_TIMEOUT_VAR: &str = "SHIFTDESK_UPLOAD_TIMEOUT_SECS";
const POLL_INTERVAL_VAR: &str = "SHIFTDESK_POLL_INTERVAL_MS";
const EXPORT_DIR_VAR: &str = "SHIFTDESK_EXPORT_DIR";
const LOG_DIR_VAR: &str = "SHIFTDESK_LOG_DIR";

/// Settings for the backend connection, polling and output locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend base URL, without a trailing slash.
    pub api_base: String,
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
    pub poll_interval: Duration,
    pub export_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(60),
            upload_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_millis(2000),
            export_dir: PathBuf::from("."),
            log_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Reads the `SHIFTDESK_*` variables, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is set but is not a whole number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let api_base = lookup(API_BASE_VAR)
            .map(|raw| raw.trim().trim_end_matches('/').to_string())
            .filter(|raw| !raw.is_empty())
            .unwrap_or(defaults.api_base);

        Ok(Self {
            api_base,
            request_timeout: Duration::from_secs(number(&lookup, TIMEOUT_VAR, 60)?),
            upload_timeout: Duration::from_secs(number(&lookup, UPLOAD_TIMEOUT_VAR, 120)?),
            poll_interval: Duration::from_millis(positive(&lookup, POLL_INTERVAL_VAR, 2000)?),
            export_dir: lookup(EXPORT_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.export_dir),
            log_dir: lookup(LOG_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
        })
    }
}

fn number(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a whole number, got {raw:?}")),
        None => Ok(default),
    }
}

/// Like [`number`], but zero is rejected too.
fn positive(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    let value = number(lookup, key, default)?;
    if value == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(value)
}

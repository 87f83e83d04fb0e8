//! `config.toml` loading.
//!
//! Every key is optional; unset keys take the defaults below, and command
//! line flags override both.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::download::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRYABLE_STATUSES};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
/// Query used when neither the file nor the command line sets one.
pub const DEFAULT_QUERY: &str = "Java nullpointer";
/// Directory PDFs are saved to.
pub const DEFAULT_OUTPUT_DIR: &str = "acm_pdfs";
/// Digital library origin.
pub const DEFAULT_BASE_URL: &str = "https://dl.acm.org";
/// Pause between consecutive entries.
pub const DEFAULT_ENTRY_DELAY_SECS: u64 = 10;
/// First retry backoff.
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1000;
/// Bound on article page loads and existence checks.
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;
/// Bound on a single PDF fetch attempt.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Errors loading or validating the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read, or was named explicitly and is missing.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Path of the config file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unknown keys or wrong types.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        /// Path of the config file.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is outside its allowed range.
    #[error("invalid config value for `{field}`: {value}. Expected {expected}")]
    Invalid {
        /// Key name.
        field: &'static str,
        /// Offending value, rendered.
        value: String,
        /// Allowed values.
        expected: &'static str,
    },
}

/// TOML-backed file configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Search query text.
    pub query: Option<String>,
    /// Directory PDFs are written to.
    pub output_dir: Option<PathBuf>,
    /// Digital library origin, e.g. `https://dl.acm.org`.
    pub base_url: Option<String>,
    /// Pause between entries, in seconds.
    pub entry_delay_secs: Option<u64>,
    /// Total fetch attempts per PDF (1..=10).
    pub max_attempts: Option<u32>,
    /// First retry backoff in milliseconds.
    pub backoff_base_ms: Option<u64>,
    /// HTTP statuses that trigger a retry.
    pub retryable_statuses: Option<Vec<u16>>,
    /// Bound on article page loads and existence checks, in seconds.
    pub lookup_timeout_secs: Option<u64>,
    /// Bound on one PDF fetch attempt, in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Stop after this many search results.
    pub max_articles: Option<usize>,
}

impl FileConfig {
    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] (attributed to `path`) for malformed
    /// TOML, unknown keys, or wrongly typed values.
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads and validates the config file.
    ///
    /// With `explicit = None` the default `config.toml` in the working
    /// directory is read if present; its absence means all defaults. An
    /// explicitly named file must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if explicit.is_none() && error.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let config = Self::from_toml_str(&raw, path)?;
        config.validate()?;
        debug!(path = %path.display(), "config file loaded");
        Ok(config)
    }

    /// Validates values against runtime constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(query) = &self.query
            && query.trim().is_empty()
        {
            return Err(invalid("query", query, "a non-empty string"));
        }
        if let Some(max_attempts) = self.max_attempts
            && !(1..=10).contains(&max_attempts)
        {
            return Err(invalid("max_attempts", max_attempts, "range: 1..=10"));
        }
        if let Some(delay) = self.entry_delay_secs
            && delay > 3600
        {
            return Err(invalid("entry_delay_secs", delay, "range: 0..=3600"));
        }
        if let Some(backoff) = self.backoff_base_ms
            && backoff > 60_000
        {
            return Err(invalid("backoff_base_ms", backoff, "range: 0..=60000"));
        }
        if let Some(statuses) = &self.retryable_statuses
            && let Some(bad) = statuses.iter().find(|s| !(400..=599).contains(*s))
        {
            return Err(invalid("retryable_statuses", bad, "HTTP error statuses 400..=599"));
        }
        validate_timeout_secs("lookup_timeout_secs", self.lookup_timeout_secs)?;
        validate_timeout_secs("request_timeout_secs", self.request_timeout_secs)?;
        if let Some(base_url) = &self.base_url
            && !is_http_url(base_url)
        {
            return Err(invalid("base_url", base_url, "an absolute http(s) URL"));
        }
        Ok(())
    }

    /// Query text, or the default.
    #[must_use]
    pub fn query_or_default(&self) -> String {
        self.query.clone().unwrap_or_else(|| DEFAULT_QUERY.to_string())
    }

    /// Retry statuses, or `[500, 502, 503, 504]`.
    #[must_use]
    pub fn retryable_statuses_or_default(&self) -> Vec<u16> {
        self.retryable_statuses
            .clone()
            .unwrap_or_else(|| DEFAULT_RETRYABLE_STATUSES.to_vec())
    }

    /// Fetch attempts, or the default of 3.
    #[must_use]
    pub fn max_attempts_or_default(&self) -> u32 {
        self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS)
    }
}

fn invalid(field: &'static str, value: impl ToString, expected: &'static str) -> ConfigError {
    ConfigError::Invalid {
        field,
        value: value.to_string(),
        expected,
    }
}

fn validate_timeout_secs(field: &'static str, value: Option<u64>) -> Result<(), ConfigError> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        return Err(invalid(field, value, "range: 1..=3600"));
    }
    Ok(())
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

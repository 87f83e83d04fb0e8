//! Error types for the Fetcher.
//!
//! Each variant carries the URL it concerns so a `Failed` outcome can be
//! logged without extra context.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while fetching PDF bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-retryable HTTP status (e.g. 403), or any success status other than 200.
    #[error("HTTP {status} fetching {url}")]
    Status {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Every attempt allowed by the retry policy failed transiently.
    #[error("exhausted retries after {attempts} attempts fetching {url}: {last_error}")]
    ExhaustedRetries {
        /// The URL that kept failing.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// Description of the final failure.
        last_error: String,
    },

    /// The URL could not be parsed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The body exceeded the configured size cap.
    #[error("response from {url} exceeds {limit} bytes")]
    TooLarge {
        /// The URL whose body was too large.
        url: String,
        /// The byte cap that was exceeded.
        limit: u64,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Creates a status error.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Creates a retry-exhaustion error.
    pub fn exhausted(url: impl Into<String>, attempts: u32, last_error: impl Into<String>) -> Self {
        Self::ExhaustedRetries {
            url: url.into(),
            attempts,
            last_error: last_error.into(),
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a size-cap error.
    pub fn too_large(url: impl Into<String>, limit: u64) -> Self {
        Self::TooLarge {
            url: url.into(),
            limit,
        }
    }

    /// Returns the HTTP status for status errors.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors writing a validated PDF to the output directory.
#[derive(Debug, Error)]
#[error("failed to write {path}: {source}")]
pub struct PersistError {
    /// Path that could not be created or written.
    pub path: PathBuf,
    /// The underlying I/O error.
    #[source]
    pub source: std::io::Error,
}

impl PersistError {
    /// Creates a persistence error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Transient failure observed during one attempt; feeds the retry loop.
#[derive(Debug)]
pub(crate) enum AttemptFailure {
    /// Retryable status, with the Retry-After header if the server sent one.
    Status {
        status: u16,
        retry_after: Option<String>,
    },
    /// Timeout, connection reset, or a body that broke mid-stream.
    Network(reqwest::Error),
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { status, .. } => write!(f, "HTTP {status}"),
            Self::Network(error) if error.is_timeout() => write!(f, "timeout: {error}"),
            Self::Network(error) => write!(f, "network error: {error}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_status_display() {
        let error = FetchError::status("https://dl.acm.org/doi/pdf/10.1145/1", 403);
        let msg = error.to_string();
        assert!(msg.contains("403"), "Expected '403' in: {msg}");
        assert!(msg.contains("10.1145/1"), "Expected URL in: {msg}");
        assert_eq!(error.http_status(), Some(403));
    }

    #[test]
    fn test_fetch_error_exhausted_display() {
        let error = FetchError::exhausted("https://example.com/a.pdf", 3, "HTTP 503");
        let msg = error.to_string();
        assert!(msg.contains("exhausted retries"), "got: {msg}");
        assert!(msg.contains("3 attempts"), "got: {msg}");
        assert!(msg.contains("HTTP 503"), "got: {msg}");
        assert_eq!(error.http_status(), None);
    }

    #[test]
    fn test_fetch_error_invalid_url_display() {
        let msg = FetchError::invalid_url("not-a-url").to_string();
        assert!(msg.contains("invalid URL"));
        assert!(msg.contains("not-a-url"));
    }

    #[test]
    fn test_attempt_failure_status_display() {
        let failure = AttemptFailure::Status {
            status: 502,
            retry_after: None,
        };
        assert_eq!(failure.to_string(), "HTTP 502");
    }

    #[test]
    fn test_persist_error_names_path() {
        let error = PersistError::io(
            "acm_pdfs/Paper.pdf",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = error.to_string();
        assert!(msg.contains("acm_pdfs/Paper.pdf"), "got: {msg}");
        assert!(msg.contains("denied"), "got: {msg}");
    }
}

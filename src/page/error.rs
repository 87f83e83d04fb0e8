//! Error types for page loading.

use thiserror::Error;

/// Errors produced while loading an HTML page.
#[derive(Debug, Error)]
pub enum PageError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} loading {url}")]
    Status {
        /// The page URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Connection failure, timeout, or a body that could not be read.
    #[error("network error loading {url}: {source}")]
    Network {
        /// The page URL.
        url: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The page did not finish loading within the lookup bound.
    #[error("timed out loading {url}")]
    Timeout {
        /// The page URL.
        url: String,
    },

    /// The URL could not be parsed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build page client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl PageError {
    /// Creates a status error.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Creates a network error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_error_status_display() {
        let msg = PageError::status("https://dl.acm.org/doi/10.1145/1", 404).to_string();
        assert!(msg.contains("404"), "got: {msg}");
        assert!(msg.contains("10.1145/1"), "got: {msg}");
    }

    #[test]
    fn test_page_error_timeout_display() {
        let msg = PageError::timeout("https://dl.acm.org/x").to_string();
        assert_eq!(msg, "timed out loading https://dl.acm.org/x");
    }
}

//! HTTP client wrapper for probing and fetching PDFs.
//!
//! This module provides the `HttpClient` struct, the Fetcher: a GET with a
//! pooled connection, bounded retries with exponential backoff on transient
//! statuses and network errors, and a strict 200-only success rule.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, MAX_PDF_BYTES, HEAD_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};
use super::error::{AttemptFailure, FetchError};
use super::retry::{FailureType, RetryDecision, RetryPolicy, parse_retry_after};
use super::Fetch;
use crate::user_agent::BROWSER_USER_AGENT;

/// Timeouts and limits for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout for a single fetch attempt.
    pub request_timeout: Duration,
    /// Timeout for the HEAD existence check.
    pub head_timeout: Duration,
    /// Largest body accepted.
    pub max_body_bytes: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            head_timeout: Duration::from_secs(HEAD_TIMEOUT_SECS),
            max_body_bytes: MAX_PDF_BYTES,
        }
    }
}

/// Bytes returned by a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchedPdf {
    /// Raw response body.
    pub bytes: Vec<u8>,
    /// Final status code (always 200).
    pub status: u16,
    /// Number of attempts it took.
    pub attempts: u32,
}

/// Outcome of a failed attempt, split by whether the retry loop may continue.
enum AttemptError {
    Permanent(FetchError),
    Transient(AttemptFailure),
}

/// HTTP client for probing and fetching PDFs with retry support.
///
/// Created once and cloned freely; clones share one connection pool.
///
/// # Example
///
/// ```no_run
/// use acmdl_core::download::{Fetch, HttpClient, HttpSettings, RetryPolicy};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(HttpSettings::default(), RetryPolicy::default())?;
/// let pdf = client.fetch("https://dl.acm.org/doi/pdf/10.1145/3597503").await?;
/// println!("{} bytes after {} attempt(s)", pdf.bytes.len(), pdf.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    policy: RetryPolicy,
    head_timeout: Duration,
    max_body_bytes: u64,
}

impl HttpClient {
    /// Creates a client with a browser-like User-Agent and the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the underlying client cannot be built.
    #[instrument(level = "debug", skip(policy), fields(max_attempts = policy.max_attempts()))]
    pub fn new(settings: HttpSettings, policy: RetryPolicy) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .gzip(true)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|source| FetchError::Client { source })?;
        Ok(Self {
            client,
            policy,
            head_timeout: settings.head_timeout,
            max_body_bytes: settings.max_body_bytes,
        })
    }

    /// Returns the retry policy in use.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Issues a HEAD request and returns the status code.
    ///
    /// Bounded by the HEAD timeout; redirects are followed.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] for unparseable URLs and
    /// [`FetchError::ExhaustedRetries`] (single attempt) for network errors.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn check_exists(&self, url: &str) -> Result<u16, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        let response = self
            .client
            .head(url)
            .timeout(self.head_timeout)
            .send()
            .await
            .map_err(|e| FetchError::exhausted(url, 1, AttemptFailure::Network(e).to_string()))?;
        let status = response.status().as_u16();
        debug!(status, "existence check complete");
        Ok(status)
    }

    /// Performs one GET attempt.
    async fn attempt(&self, url: &str) -> Result<Vec<u8>, AttemptError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/pdf,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| AttemptError::Transient(AttemptFailure::Network(e)))?;

        let status = response.status().as_u16();
        if status != 200 {
            if status >= 400 && self.policy.classify_status(status) == FailureType::Transient {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .map(ToString::to_string);
                return Err(AttemptError::Transient(AttemptFailure::Status {
                    status,
                    retry_after,
                }));
            }
            return Err(AttemptError::Permanent(FetchError::status(url, status)));
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes)
        {
            return Err(AttemptError::Permanent(FetchError::too_large(
                url,
                self.max_body_bytes,
            )));
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AttemptError::Transient(AttemptFailure::Network(e)))?;
            if (body.len() + chunk.len()) as u64 > self.max_body_bytes {
                return Err(AttemptError::Permanent(FetchError::too_large(
                    url,
                    self.max_body_bytes,
                )));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait]
impl Fetch for HttpClient {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &str) -> Result<FetchedPdf, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(attempt, "attempting fetch");

            let failure = match self.attempt(url).await {
                Ok(bytes) => {
                    info!(bytes = bytes.len(), attempts = attempt, "fetch complete");
                    return Ok(FetchedPdf {
                        bytes,
                        status: 200,
                        attempts: attempt,
                    });
                }
                Err(AttemptError::Permanent(permanent)) => {
                    debug!(error = %permanent, "not retrying fetch");
                    return Err(permanent);
                }
                Err(AttemptError::Transient(transient)) => transient,
            };

            match self.policy.should_retry(FailureType::Transient, attempt) {
                RetryDecision::Retry {
                    delay: backoff_delay,
                    attempt: next_attempt,
                } => {
                    let retry_after_delay = match &failure {
                        AttemptFailure::Status {
                            retry_after: Some(value),
                            ..
                        } => parse_retry_after(value),
                        _ => None,
                    };
                    let delay = retry_after_delay.unwrap_or(backoff_delay);
                    warn!(
                        attempt = next_attempt,
                        max_attempts = self.policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        using_retry_after = retry_after_delay.is_some(),
                        error = %failure,
                        "retrying fetch"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(%reason, "giving up on fetch");
                    return Err(FetchError::exhausted(url, attempt, failure.to_string()));
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::user_agent::has_browser_user_agent;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_client(max_attempts: u32) -> HttpClient {
        let policy = RetryPolicy::new(
            max_attempts,
            Duration::from_millis(1),
            Duration::from_millis(5),
            2.0,
        );
        HttpClient::new(HttpSettings::default(), policy).unwrap()
    }

    #[test]
    fn test_fetch_invalid_url_fails_without_request() {
        let client = fast_client(3);
        let result = tokio_test::block_on(client.fetch("not-a-valid-url"));
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_fetch_success_returns_body_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doi/pdf/10.1/x"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 body".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client(3);
        let pdf = client
            .fetch(&format!("{}/doi/pdf/10.1/x", server.uri()))
            .await
            .unwrap();
        assert_eq!(pdf.bytes, b"%PDF-1.4 body");
        assert_eq!(pdf.status, 200);
        assert_eq!(pdf.attempts, 1);
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(has_browser_user_agent)
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client(1);
        assert!(client.fetch(&format!("{}/a.pdf", server.uri())).await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_non_200_success_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client(3);
        let result = client.fetch(&format!("{}/a.pdf", server.uri())).await;
        assert!(matches!(result, Err(FetchError::Status { status: 204, .. })));
    }

    #[tokio::test]
    async fn test_fetch_body_over_cap_is_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64]))
            .mount(&server)
            .await;

        let settings = HttpSettings {
            max_body_bytes: 16,
            ..HttpSettings::default()
        };
        let client = HttpClient::new(settings, RetryPolicy::with_max_attempts(1)).unwrap();
        let result = client.fetch(&format!("{}/big.pdf", server.uri())).await;
        assert!(matches!(result, Err(FetchError::TooLarge { limit: 16, .. })));
    }

    #[tokio::test]
    async fn test_check_exists_returns_status() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/gone.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = fast_client(1);
        let status = client
            .check_exists(&format!("{}/gone.pdf", server.uri()))
            .await
            .unwrap();
        assert_eq!(status, 404);
    }
}

//! Plain-HTTP page source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::{debug, instrument};
use url::Url;

use super::{PageDocument, PageError, PageSource};
use crate::user_agent::BROWSER_USER_AGENT;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const PAGE_TIMEOUT_SECS: u64 = 30;

/// Loads pages over HTTP with a cookie-carrying, browser-like client.
///
/// Does not execute scripts; the digital library serves access markers and
/// PDF anchors in its initial markup.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    /// Creates a page source with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Client`] if the client cannot be built.
    pub fn new() -> Result<Self, PageError> {
        Self::with_timeout(Duration::from_secs(PAGE_TIMEOUT_SECS))
    }

    /// Creates a page source whose loads give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Client`] if the client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, PageError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(timeout)
            .cookie_store(true)
            .gzip(true)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|source| PageError::Client { source })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    #[instrument(skip(self), fields(url = %url))]
    async fn load(&self, url: &str) -> Result<PageDocument, PageError> {
        Url::parse(url).map_err(|_| PageError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| classify_send_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageError::status(url, status.as_u16()));
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| classify_send_error(url, e))?;
        debug!(final_url = %final_url, bytes = html.len(), "page loaded");
        Ok(PageDocument::new(final_url, html))
    }
}

fn classify_send_error(url: &str, error: reqwest::Error) -> PageError {
    if error.is_timeout() {
        PageError::timeout(url)
    } else {
        PageError::network(url, error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::user_agent::has_browser_user_agent;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_load_returns_document_with_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doi/10.1145/1"))
            .and(has_browser_user_agent)
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Title</h1>"))
            .mount(&server)
            .await;

        let source = HttpPageSource::new().unwrap();
        let url = format!("{}/doi/10.1145/1", server.uri());
        let doc = source.load(&url).await.unwrap();
        assert_eq!(doc.url().as_str(), url);
        assert!(doc.contains_text("<h1>Title</h1>"));
    }

    #[tokio::test]
    async fn test_load_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = HttpPageSource::new().unwrap();
        let result = source.load(&format!("{}/action/doSearch", server.uri())).await;
        assert!(matches!(result, Err(PageError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_load_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let source = HttpPageSource::with_timeout(Duration::from_millis(50)).unwrap();
        let result = source.load(&format!("{}/slow", server.uri())).await;
        assert!(matches!(result, Err(PageError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_load_invalid_url() {
        let source = HttpPageSource::new().unwrap();
        assert!(matches!(
            source.load("not a url").await,
            Err(PageError::InvalidUrl { .. })
        ));
    }
}

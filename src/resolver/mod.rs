//! Link Resolver: maps an [`ArticleReference`] to a downloadable PDF URL or
//! to a skip/fail verdict.
//!
//! # Architecture
//!
//! - [`Resolve`] - Async trait the pipeline depends on
//! - [`LinkResolver`] - Production resolver over a [`PageSource`] and an [`HttpClient`]
//! - [`Resolution`] - Either a [`ResolvedLink`] or a final [`DownloadResult`]
//!
//! Resolution order for one reference:
//!
//! 1. A known PDF URL, or a source URL that already is a PDF link, skips
//!    page inspection and goes straight to the check in step 5.
//! 2. The article page is loaded within the lookup timeout; a load failure
//!    or timeout is `Skipped`.
//! 3. Without an open, public, or free access marker the entry is `Skipped`
//!    as "not open access", whatever anchors the page has.
//! 4. A primary PDF anchor is preferred, then a "read online" anchor.
//! 5. The candidate is checked with a HEAD request; a non-success status is
//!    `Skipped` as inaccessible.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use acmdl_core::{
//!     ArticleReference, HttpClient, HttpPageSource, HttpSettings, LinkResolver, Resolve,
//!     RetryPolicy,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pages = Arc::new(HttpPageSource::new()?);
//! let client = HttpClient::new(HttpSettings::default(), RetryPolicy::default())?;
//! let resolver = LinkResolver::new(pages, client, Duration::from_secs(10));
//!
//! let reference = ArticleReference::new("https://dl.acm.org/doi/10.1145/3597503");
//! println!("{:?}", resolver.resolve(&reference).await);
//! # Ok(())
//! # }
//! ```

mod access;
mod links;
mod utils;

pub use utils::{compile_static_regex, is_direct_pdf_url, is_reader_url, landing_page_url};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use crate::download::HttpClient;
use crate::model::{ArticleReference, DownloadResult, SkipReason};
use crate::page::{PageDocument, PageError, PageSource};

use access::detect_access_tier;
use links::{LinkKind, find_pdf_link, find_title};

/// A PDF URL ready to fetch, with the title found on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// Absolute PDF URL.
    pub pdf_url: String,
    /// Article title, when one was found.
    pub title: Option<String>,
}

/// Outcome of resolving one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A link to fetch.
    Link(ResolvedLink),
    /// A final `Skipped` or `Failed` verdict; nothing to fetch.
    Verdict(DownloadResult),
}

impl Resolution {
    fn skipped(reason: SkipReason) -> Self {
        Self::Verdict(DownloadResult::skipped(reason))
    }
}

/// Resolves references to PDF links.
///
/// Uses `async_trait` so the pipeline can hold an `Arc<dyn Resolve>`.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Resolves `reference`. Never errors: every outcome is a [`Resolution`].
    async fn resolve(&self, reference: &ArticleReference) -> Resolution;
}

/// Resolver that inspects article pages through a [`PageSource`] and
/// checks candidates with an [`HttpClient`].
pub struct LinkResolver {
    pages: Arc<dyn PageSource>,
    client: HttpClient,
    lookup_timeout: Duration,
}

impl LinkResolver {
    /// Creates a resolver; `lookup_timeout` bounds each article page load.
    #[must_use]
    pub fn new(pages: Arc<dyn PageSource>, client: HttpClient, lookup_timeout: Duration) -> Self {
        Self {
            pages,
            client,
            lookup_timeout,
        }
    }

    async fn load_page(&self, url: &str) -> Result<PageDocument, PageError> {
        match tokio::time::timeout(self.lookup_timeout, self.pages.load(url)).await {
            Ok(result) => result,
            Err(_) => Err(PageError::timeout(url)),
        }
    }

    async fn check_exists(&self, link: ResolvedLink) -> Resolution {
        match self.client.check_exists(&link.pdf_url).await {
            Ok(status) if (200..300).contains(&status) => Resolution::Link(link),
            Ok(status) => Resolution::skipped(SkipReason::Inaccessible(status.to_string())),
            Err(error) => Resolution::skipped(SkipReason::Inaccessible(error.to_string())),
        }
    }
}

impl std::fmt::Debug for LinkResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkResolver")
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Resolve for LinkResolver {
    #[instrument(skip(self, reference), fields(url = %reference.source_url))]
    async fn resolve(&self, reference: &ArticleReference) -> Resolution {
        if let Some(pdf_url) = direct_pdf_url(reference) {
            debug!(pdf_url = %pdf_url, "direct PDF link; skipping page inspection");
            return self
                .check_exists(ResolvedLink {
                    pdf_url,
                    title: reference.title.clone(),
                })
                .await;
        }

        if Url::parse(&reference.source_url).is_err() {
            return Resolution::Verdict(DownloadResult::failed(format!(
                "invalid URL: {}",
                reference.source_url
            )));
        }

        let page = match self.load_page(&reference.source_url).await {
            Ok(page) => page,
            Err(error) => {
                return Resolution::skipped(SkipReason::PageUnavailable(error.to_string()));
            }
        };

        let tier = detect_access_tier(&page);
        if !tier.is_eligible() {
            return Resolution::skipped(SkipReason::NotOpenAccess);
        }

        let Some((pdf_url, kind)) = find_pdf_link(&page) else {
            return Resolution::skipped(SkipReason::NoPdfLink);
        };
        if kind == LinkKind::ReadOnline {
            debug!(pdf_url = %pdf_url, "no primary PDF anchor; using read-online link");
        }

        let title = find_title(&page).or_else(|| reference.title.clone());
        self.check_exists(ResolvedLink { pdf_url, title }).await
    }
}

/// The PDF URL for references that need no page inspection.
fn direct_pdf_url(reference: &ArticleReference) -> Option<String> {
    reference.pdf_url.clone().or_else(|| {
        is_direct_pdf_url(&reference.source_url).then(|| reference.source_url.clone())
    })
}

//! Search URL construction and result enumeration.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

use crate::model::ArticleReference;
use crate::page::{PageError, PageSource};
use crate::resolver::{is_direct_pdf_url, is_reader_url, landing_page_url};

/// Path of the digital library's search endpoint.
pub const SEARCH_PATH: &str = "/action/doSearch";

/// Text the site serves in place of results when the client IP is blocked.
pub const IP_BLOCK_MARKER: &str = "Your IP Address has been blocked";

/// Fatal, run-level search failures.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The base URL could not be parsed or joined.
    #[error("invalid base URL: {url}")]
    InvalidBaseUrl {
        /// The base URL as configured.
        url: String,
    },

    /// The search results page could not be loaded.
    #[error("search page unavailable: {source}")]
    PageUnavailable {
        /// The underlying page error.
        #[source]
        source: PageError,
    },

    /// The site reported the client IP as blocked.
    #[error("IP address blocked by {url}; use a different network or wait before retrying")]
    IpBlocked {
        /// The search URL that returned the block page.
        url: String,
    },
}

/// A search query; immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
}

impl SearchQuery {
    /// Creates a query from free text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The query text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Builds `<base>/action/doSearch?AllField=<query>` with the query
    /// form-encoded (spaces become `+`).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidBaseUrl`] if `base_url` is not an absolute URL.
    ///
    /// # Example
    ///
    /// ```
    /// use acmdl_core::SearchQuery;
    ///
    /// let url = SearchQuery::new("Java nullpointer")
    ///     .search_url("https://dl.acm.org")
    ///     .unwrap();
    /// assert_eq!(
    ///     url.as_str(),
    ///     "https://dl.acm.org/action/doSearch?AllField=Java+nullpointer"
    /// );
    /// ```
    pub fn search_url(&self, base_url: &str) -> Result<Url, SearchError> {
        let invalid = || SearchError::InvalidBaseUrl {
            url: base_url.to_string(),
        };
        let base = Url::parse(base_url).map_err(|_| invalid())?;
        let mut url = base.join(SEARCH_PATH).map_err(|_| invalid())?;
        url.query_pairs_mut().clear().append_pair("AllField", &self.text);
        Ok(url)
    }
}

/// Loads the search results page and returns every distinct article link on it.
///
/// Links are anchors whose `href` contains `/doi/`, absolutised against the
/// page URL and reduced to the article landing page, so a hit's title link
/// and its PDF or reader icon yield one reference. References keep
/// first-seen order. Title-link text becomes the reference's title.
/// `max_articles` truncates the list when set. An empty result is logged,
/// not an error.
///
/// # Errors
///
/// Returns [`SearchError`] when the base URL is invalid, the page cannot be
/// loaded, or the page carries the IP-block marker.
#[instrument(skip(pages, query), fields(query = %query.text()))]
pub async fn enumerate_articles(
    pages: &dyn PageSource,
    query: &SearchQuery,
    base_url: &str,
    max_articles: Option<usize>,
) -> Result<Vec<ArticleReference>, SearchError> {
    let url = query.search_url(base_url)?;
    info!(url = %url, "loading search page");

    let page = pages
        .load(url.as_str())
        .await
        .map_err(|source| SearchError::PageUnavailable { source })?;

    if page.contains_text(IP_BLOCK_MARKER) {
        return Err(SearchError::IpBlocked {
            url: url.to_string(),
        });
    }

    let mut references: Vec<ArticleReference> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for anchor in page.anchors() {
        let Some(landing) = landing_page_url(&anchor.href) else {
            continue;
        };
        // PDF and reader icons carry labels like "PDF", not titles.
        let title = (!anchor.text.is_empty()
            && !is_direct_pdf_url(&anchor.href)
            && !is_reader_url(&anchor.href))
        .then_some(anchor.text);

        if let Some(&position) = positions.get(&landing) {
            let reference = &mut references[position];
            if reference.title.is_none() {
                reference.title = title;
            }
            continue;
        }
        positions.insert(landing.clone(), references.len());
        let mut reference = ArticleReference::new(landing);
        reference.title = title;
        references.push(reference);
    }

    if let Some(limit) = max_articles {
        references.truncate(limit);
    }

    if references.is_empty() {
        warn!("no articles found; check the query or the site structure");
    } else {
        info!(count = references.len(), "articles found");
    }
    Ok(references)
}

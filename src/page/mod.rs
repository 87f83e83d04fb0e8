//! Page loading and element lookup.
//!
//! The resolver and search enumeration never talk HTTP for HTML directly;
//! they go through a [`PageSource`], which returns a [`PageDocument`] they
//! can query by selector, meta name, or anchor. [`HttpPageSource`] is the
//! production implementation; tests substitute canned pages.

use async_trait::async_trait;

mod document;
mod error;
mod http;

pub use document::{Anchor, PageDocument, compile_static_selector};
pub use error::PageError;
pub use http::HttpPageSource;

/// Loads HTML pages for inspection.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Loads `url` and returns the rendered document.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] if the page cannot be loaded.
    async fn load(&self, url: &str) -> Result<PageDocument, PageError>;

    /// Releases any session held by the source.
    ///
    /// Called once when a run ends, on every exit path.
    async fn close(&self) {}
}

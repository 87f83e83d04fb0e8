//! Fetching, validating, naming, and persisting article PDFs.
//!
//! # Features
//!
//! - GET with a browser-like User-Agent and a strict 200-only success rule
//! - Bounded retries with exponential backoff on transient statuses and
//!   network errors, honouring `Retry-After`
//! - Structural PDF validation (parses, has at least one page)
//! - Filesystem-safe names from article titles
//! - Atomic writes into the output directory
//!
//! # Example
//!
//! ```no_run
//! use acmdl_core::download::{Fetch, HttpClient, HttpSettings, RetryPolicy, is_valid_pdf};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(HttpSettings::default(), RetryPolicy::default())?;
//! let pdf = client.fetch("https://dl.acm.org/doi/pdf/10.1145/3597503").await?;
//! println!("valid: {}", is_valid_pdf(&pdf.bytes));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

mod client;
mod constants;
mod error;
mod filename;
mod persist;
mod retry;
mod validate;

pub use client::{FetchedPdf, HttpClient, HttpSettings};
pub use constants::{MAX_PDF_BYTES, MAX_RETRY_AFTER};
pub use error::{FetchError, PersistError};
pub use filename::{MAX_STEM_BYTES, PDF_EXTENSION, RunNames, sanitize};
pub use persist::{remove_stale_parts, write_atomic};
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRYABLE_STATUSES, FailureType, RetryDecision, RetryPolicy,
    parse_retry_after,
};
pub use validate::is_valid_pdf;

#[cfg(test)]
pub(crate) use validate::tests::pdf_with_pages;

/// Retrieves PDF bytes for a resolved URL.
///
/// Implemented by [`HttpClient`]; the pipeline depends on this trait so tests
/// can substitute a scripted fetcher.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches `url`, retrying transient failures per the retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on a permanent status, exhausted retries, an
    /// invalid URL, or an oversized body.
    async fn fetch(&self, url: &str) -> Result<FetchedPdf, FetchError>;
}

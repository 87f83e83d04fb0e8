//! ACM Digital Library harvester core library.
//!
//! This library searches the ACM Digital Library for a query, walks the
//! article pages it finds, and saves every open-access PDF it can reach to a
//! local directory.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`search`] - Search URL construction and result enumeration
//! - [`page`] - Page loading and element lookup (the browser collaborator seam)
//! - [`resolver`] - Access-tier gating and PDF link discovery
//! - [`download`] - PDF fetching with retry, validation, naming, persistence
//! - [`pipeline`] - Sequential orchestration of resolve, fetch, validate, save
//! - [`cancel`] - Cooperative cancellation between entries
//! - [`config`] - `config.toml` loading

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cancel;
pub mod config;
pub mod download;
pub mod model;
pub mod page;
pub mod pipeline;
pub mod resolver;
pub mod search;
mod user_agent;

// Re-export commonly used types
pub use cancel::CancellationSignal;
pub use config::{ConfigError, FileConfig};
pub use download::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRYABLE_STATUSES, Fetch, FetchError, FetchedPdf, HttpClient,
    HttpSettings, RetryPolicy, is_valid_pdf, sanitize,
};
pub use model::{AccessTier, ArticleReference, DownloadResult, RunSummary, SkipReason};
pub use page::{HttpPageSource, PageDocument, PageError, PageSource};
pub use pipeline::DownloadPipeline;
pub use resolver::{LinkResolver, Resolution, Resolve, ResolvedLink};
pub use search::{SearchError, SearchQuery, enumerate_articles};
pub use user_agent::BROWSER_USER_AGENT;

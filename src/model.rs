//! Data model shared by the resolver, fetcher, and pipeline.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// A candidate article discovered by search enumeration.
///
/// Consumed exactly once by the pipeline, which turns it into a
/// [`DownloadResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleReference {
    /// Article landing page (or direct PDF) URL.
    pub source_url: String,
    /// PDF URL when already known; skips page inspection entirely.
    pub pdf_url: Option<String>,
    /// Title seen at discovery time (search listing anchor text).
    pub title: Option<String>,
}

impl ArticleReference {
    /// Creates a reference with only a source URL.
    #[must_use]
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            pdf_url: None,
            title: None,
        }
    }

    /// Attaches a title seen at discovery time.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attaches an already-resolved PDF URL.
    #[must_use]
    pub fn with_pdf_url(mut self, pdf_url: impl Into<String>) -> Self {
        self.pdf_url = Some(pdf_url.into());
        self
    }
}

/// Availability classification of an article's full text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessTier {
    Open,
    Public,
    Free,
    Restricted,
    Unknown,
}

impl AccessTier {
    /// Only open, public, and free articles may be downloaded.
    #[must_use]
    pub fn is_eligible(self) -> bool {
        matches!(self, Self::Open | Self::Public | Self::Free)
    }

    /// Classifies a marker label such as `"Open Access"` or `"Free Access"`.
    ///
    /// Matching is case-insensitive and whitespace-tolerant. Returns `None`
    /// when the label says nothing about access.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();
        if normalized.contains("open access") {
            Some(Self::Open)
        } else if normalized.contains("public access") {
            Some(Self::Public)
        } else if normalized.contains("free access") {
            Some(Self::Free)
        } else if normalized.contains("restricted access")
            || normalized.contains("subscription required")
            || normalized.contains("purchase")
        {
            Some(Self::Restricted)
        } else {
            None
        }
    }
}

/// Why an entry was skipped. Skips are expected outcomes, not defects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// No open/public/free marker on the article page.
    NotOpenAccess,
    /// Neither a PDF anchor nor a read-online anchor exists.
    NoPdfLink,
    /// The existence check returned a non-success status or failed outright.
    Inaccessible(String),
    /// The article page could not be loaded in time.
    PageUnavailable(String),
    /// The payload did not parse as a PDF with at least one page.
    InvalidPdf,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOpenAccess => f.write_str("not open access"),
            Self::NoPdfLink => f.write_str("no pdf link"),
            Self::Inaccessible(detail) => write!(f, "inaccessible: {detail}"),
            Self::PageUnavailable(detail) => write!(f, "page unavailable: {detail}"),
            Self::InvalidPdf => f.write_str("invalid pdf"),
        }
    }
}

/// Outcome of one pipeline attempt for one [`ArticleReference`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DownloadResult {
    Saved { path: PathBuf, byte_size: u64 },
    Skipped { reason: SkipReason },
    Failed { reason: String },
}

impl DownloadResult {
    /// Shorthand for a skip verdict.
    #[must_use]
    pub fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    /// Shorthand for a failure verdict.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

/// Saved/skipped/failed counts for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub bytes_saved: u64,
}

impl RunSummary {
    /// Tallies a slice of results.
    #[must_use]
    pub fn from_results(results: &[DownloadResult]) -> Self {
        results
            .iter()
            .fold(Self::default(), |mut summary, result| {
                match result {
                    DownloadResult::Saved { byte_size, .. } => {
                        summary.saved += 1;
                        summary.bytes_saved += byte_size;
                    }
                    DownloadResult::Skipped { .. } => summary.skipped += 1,
                    DownloadResult::Failed { .. } => summary.failed += 1,
                }
                summary
            })
    }

    /// Total number of entries that produced a result.
    #[must_use]
    pub fn total(&self) -> usize {
        self.saved + self.skipped + self.failed
    }
}

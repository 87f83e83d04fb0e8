//! Shared utilities for the resolver and search enumeration: static regexes
//! and URL classification.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Compiles a regex at static init; panics on invalid pattern.
pub fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Paths served as PDF bytes rather than as an article landing page.
static DIRECT_PDF_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)(/doi/pdf/|\.pdf$)"));

/// Paths of the online PDF reader.
static EPDF_PATH_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?i)/doi/epdf/"));

/// Returns true if `url` points straight at a PDF: its path contains
/// `/doi/pdf/` or ends in `.pdf`.
#[must_use]
pub fn is_direct_pdf_url(url: &str) -> bool {
    Url::parse(url).is_ok_and(|parsed| DIRECT_PDF_PATH_RE.is_match(parsed.path()))
}

/// Returns true if `url` points at the online reader (`/doi/epdf/`).
#[must_use]
pub fn is_reader_url(url: &str) -> bool {
    Url::parse(url).is_ok_and(|parsed| EPDF_PATH_RE.is_match(parsed.path()))
}

/// Article views that share a DOI with the landing page.
const DOI_VIEW_SEGMENTS: [&str; 5] = ["pdf/", "epdf/", "abs/", "full/", "fullHtml/"];

/// Maps any `/doi/` link (landing page, PDF, reader, abstract) to the
/// article's landing page, without query or fragment.
///
/// Returns `None` for URLs that do not name an article.
#[must_use]
pub fn landing_page_url(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    let landing_path = {
        let path = parsed.path();
        let start = path.find("/doi/")? + "/doi/".len();
        let (head, rest) = path.split_at(start);
        let doi = DOI_VIEW_SEGMENTS
            .iter()
            .find_map(|segment| rest.strip_prefix(segment))
            .unwrap_or(rest);
        if doi.is_empty() {
            return None;
        }
        format!("{head}{doi}")
    };
    parsed.set_path(&landing_path);
    parsed.set_query(None);
    parsed.set_fragment(None);
    Some(parsed.into())
}

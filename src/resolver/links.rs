//! PDF anchor and title discovery on article pages.

use std::sync::LazyLock;

use scraper::Selector;

use super::utils::{is_direct_pdf_url, is_reader_url};
use crate::page::{PageDocument, compile_static_selector};

static CITATION_TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(".citation__title"));
static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("h1"));

const READ_ONLINE_TEXT: &str = "read online";

/// Which kind of anchor produced the candidate URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkKind {
    /// `citation_pdf_url` meta tag, a `/doi/pdf/` anchor, or a `.pdf` anchor.
    Primary,
    /// The online reader (`/doi/epdf/` or a "read online" anchor).
    ReadOnline,
}

/// Finds the best PDF candidate on the page.
///
/// Primary candidates, in order: the `citation_pdf_url` meta tag, the first
/// anchor whose path contains `/doi/pdf/` or ends in `.pdf`. Failing those,
/// the first "read online" anchor.
pub(crate) fn find_pdf_link(page: &PageDocument) -> Option<(String, LinkKind)> {
    if let Some(url) = page
        .meta_content("citation_pdf_url")
        .and_then(|content| page.absolutize(&content))
    {
        return Some((url, LinkKind::Primary));
    }

    let anchors = page.anchors();
    if let Some(anchor) = anchors.iter().find(|a| is_direct_pdf_url(&a.href)) {
        return Some((anchor.href.clone(), LinkKind::Primary));
    }

    anchors
        .into_iter()
        .find(|a| is_reader_url(&a.href) || a.text.to_lowercase().contains(READ_ONLINE_TEXT))
        .map(|a| (a.href, LinkKind::ReadOnline))
}

/// Finds the article title: `.citation__title`, the `citation_title` meta
/// tag, then the first `<h1>`.
pub(crate) fn find_title(page: &PageDocument) -> Option<String> {
    page.first_text(&CITATION_TITLE_SELECTOR)
        .or_else(|| page.meta_content("citation_title"))
        .or_else(|| page.first_text(&HEADING_SELECTOR))
}

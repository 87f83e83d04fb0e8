//! Loaded HTML page with element lookup helpers.
//!
//! `scraper::Html` is not `Send`, so the document keeps the raw markup and
//! parses on demand inside each (synchronous) lookup. Pages are small and
//! lookups few, so the reparse cost does not matter.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiles a CSS selector at static init; panics on invalid selector.
pub fn compile_static_selector(selector: &str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|e| panic!("invalid static selector '{selector}': {e}"))
}

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("a[href]"));
static META_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("meta[content]"));

/// An anchor found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Absolute URL the anchor points to.
    pub href: String,
    /// Visible text, whitespace-collapsed.
    pub text: String,
}

/// A loaded page: its final URL and raw HTML.
#[derive(Debug, Clone)]
pub struct PageDocument {
    url: Url,
    html: String,
}

impl PageDocument {
    /// Wraps already-loaded markup.
    #[must_use]
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    /// URL the page was loaded from, after redirects.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Raw markup.
    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Returns true if the raw markup contains `needle`.
    #[must_use]
    pub fn contains_text(&self, needle: &str) -> bool {
        self.html.contains(needle)
    }

    /// Every anchor on the page with its `href` made absolute against the page URL.
    ///
    /// Anchors whose `href` cannot be resolved (or is a `javascript:`/`mailto:`
    /// link) are dropped. Document order is preserved.
    #[must_use]
    pub fn anchors(&self) -> Vec<Anchor> {
        self.anchors_matching(&ANCHOR_SELECTOR)
    }

    /// Anchors matched by `selector`, absolutised like [`anchors`](Self::anchors).
    #[must_use]
    pub fn anchors_matching(&self, selector: &Selector) -> Vec<Anchor> {
        let document = Html::parse_document(&self.html);
        document
            .select(selector)
            .filter_map(|element| {
                let href = element.value().attr("href")?;
                let href = self.absolutize(href)?;
                Some(Anchor {
                    href,
                    text: collapsed_text(element),
                })
            })
            .collect()
    }

    /// Collapsed text of the first element matched by `selector` that has any.
    #[must_use]
    pub fn first_text(&self, selector: &Selector) -> Option<String> {
        let document = Html::parse_document(&self.html);
        document
            .select(selector)
            .map(collapsed_text)
            .find(|text| !text.is_empty())
    }

    /// `content` of the first `<meta name=..>` or `<meta property=..>` tag
    /// whose name matches `name` (case-insensitive).
    #[must_use]
    pub fn meta_content(&self, name: &str) -> Option<String> {
        let document = Html::parse_document(&self.html);
        document
            .select(&META_SELECTOR)
            .filter(|element| {
                let value = element.value();
                value
                    .attr("name")
                    .or_else(|| value.attr("property"))
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .filter_map(|element| element.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
            .map(ToString::to_string)
    }

    /// For every element matched by `selector`, the values of `attributes`
    /// it carries, plus its text when `include_text` is set.
    #[must_use]
    pub fn labels(&self, selector: &Selector, attributes: &[&str], include_text: bool) -> Vec<String> {
        let document = Html::parse_document(&self.html);
        let mut labels = Vec::new();
        for element in document.select(selector) {
            for attribute in attributes {
                if let Some(value) = element.value().attr(attribute) {
                    labels.push(value.to_string());
                }
            }
            if include_text {
                let text = collapsed_text(element);
                if !text.is_empty() {
                    labels.push(text);
                }
            }
        }
        labels
    }

    /// Resolves `href` against the page URL.
    #[must_use]
    pub fn absolutize(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }
        let joined = self.url.join(href).ok()?;
        matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
    }
}

fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

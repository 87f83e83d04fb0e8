//! Access-tier detection on article pages.

use std::sync::LazyLock;

use scraper::Selector;
use tracing::debug;

use crate::model::AccessTier;
use crate::page::{PageDocument, compile_static_selector};

/// Elements that carry an access label in an attribute
/// (`<i aria-label="Open Access">`, `<img alt="Free Access">`).
static LABELLED_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("[aria-label], [title], img[alt]"));

/// Elements whose text is the label (`<span class="access__label">Free Access</span>`).
static ACCESS_CLASS_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"[class*="access"], [class*="Access"]"#));

const LABEL_ATTRIBUTES: [&str; 3] = ["aria-label", "title", "alt"];

/// Classifies the page's access tier from its markers.
///
/// Any eligible marker (open, public, free) makes the page eligible; failing
/// that, an explicit restricted marker yields [`AccessTier::Restricted`];
/// a page without markers is [`AccessTier::Unknown`].
pub(crate) fn detect_access_tier(page: &PageDocument) -> AccessTier {
    let mut labels = page.labels(&LABELLED_SELECTOR, &LABEL_ATTRIBUTES, false);
    labels.extend(page.labels(&ACCESS_CLASS_SELECTOR, &[], true));

    let mut tier = AccessTier::Unknown;
    for label in &labels {
        match AccessTier::from_label(label) {
            Some(found) if found.is_eligible() => {
                debug!(label = %label, tier = ?found, "access marker");
                return found;
            }
            Some(found) => tier = found,
            None => {}
        }
    }
    debug!(tier = ?tier, markers = labels.len(), "no eligible access marker");
    tier
}

//! PDF Validator.

use std::panic::{AssertUnwindSafe, catch_unwind};

use lopdf::Document;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Returns true iff `bytes` parse as a PDF document with at least one page.
///
/// Malformed, truncated, or empty input yields `false`; parser panics are
/// contained and also yield `false`.
#[must_use]
pub fn is_valid_pdf(bytes: &[u8]) -> bool {
    if !bytes.starts_with(PDF_MAGIC) {
        debug!(len = bytes.len(), "missing PDF header");
        return false;
    }

    match catch_unwind(AssertUnwindSafe(|| Document::load_mem(bytes))) {
        Ok(Ok(document)) => {
            let pages = document.get_pages().len();
            debug!(pages, "parsed PDF");
            pages >= 1
        }
        Ok(Err(error)) => {
            debug!(error = %error, "PDF parse failed");
            false
        }
        Err(_) => {
            debug!("PDF parser panicked");
            false
        }
    }
}

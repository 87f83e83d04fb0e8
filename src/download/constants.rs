//! Constants for the download module (timeouts, retry, size limits).

use std::time::Duration;

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default whole-request timeout for PDF fetches (60 seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default timeout for the HEAD existence check (10 seconds).
pub const HEAD_TIMEOUT_SECS: u64 = 10;

/// Maximum Retry-After header value honoured (2 minutes).
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(120);

/// Largest PDF body accepted before the fetch is aborted (256 MiB).
pub const MAX_PDF_BYTES: u64 = 256 * 1024 * 1024;

//! Shared User-Agent string for page loads and PDF fetches.
//!
//! The digital library rejects obvious tool traffic, so every request
//! presents itself as a desktop browser.

/// Browser-like User-Agent sent with every page load, HEAD request and fetch.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Matches requests whose whole `User-Agent` header equals [`BROWSER_USER_AGENT`].
///
/// `wiremock::matchers::header` splits values at commas, which breaks on
/// `(KHTML, like Gecko)`.
#[cfg(test)]
pub(crate) fn has_browser_user_agent(request: &wiremock::Request) -> bool {
    request
        .headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        == Some(BROWSER_USER_AGENT)
}

//! Filename sanitization for saved PDFs.
//!
//! Titles come straight from article pages and may contain path separators or
//! quotes; [`sanitize`] turns them into a single safe path component.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Extension appended to every saved article.
pub const PDF_EXTENSION: &str = "pdf";

/// Longest stem [`sanitize`] returns, in bytes. Leaves room for a collision
/// suffix, the extension and the `.part` wrapper within the usual 255-byte
/// file name limit.
pub const MAX_STEM_BYTES: usize = 200;

/// Turns an arbitrary title into a filesystem-safe file stem.
///
/// `/` and `\` become `-`; `"` and `'` are removed; line breaks, tabs and
/// runs of whitespace collapse to one space; other control characters are
/// removed. The result is trimmed and capped at [`MAX_STEM_BYTES`] on a
/// character boundary. An empty result (or one that would be a relative
/// path segment such as `..`) falls back to `article_<unixTimestamp>`.
///
/// # Example
///
/// ```
/// use acmdl_core::sanitize;
///
/// assert_eq!(sanitize("Foo/Bar"), "Foo-Bar");
/// assert_eq!(sanitize("It's \"quoted\""), "Its quoted");
/// ```
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter_map(|c| match c {
            '/' | '\\' => Some('-'),
            '"' | '\'' => None,
            c if c.is_whitespace() => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    let capped = truncate_at_char_boundary(&collapsed, MAX_STEM_BYTES).trim_end();
    if capped.is_empty() || capped.chars().all(|c| c == '.') {
        return fallback_stem();
    }
    capped.to_string()
}

fn truncate_at_char_boundary(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Returns `article_<unixTimestamp>`.
fn fallback_stem() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("article_{timestamp}")
}

/// Tracks stems written during one run and hands out collision-free ones.
///
/// The first claim of a stem gets it verbatim; later claims get `_2`, `_3`, ...
/// Files left over from earlier runs are not consulted, so re-running a query
/// overwrites them.
#[derive(Debug, Default)]
pub struct RunNames {
    taken: HashSet<String>,
}

impl RunNames {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `stem`, or the first free suffixed variant, and returns
    /// the full file name including the `.pdf` extension.
    pub fn claim(&mut self, stem: &str) -> String {
        let mut candidate = stem.to_string();
        let mut suffix = 2u32;
        while !self.taken.insert(candidate.to_lowercase()) {
            candidate = format!("{stem}_{suffix}");
            suffix += 1;
        }
        format!("{candidate}.{PDF_EXTENSION}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn is_fallback(name: &str) -> bool {
        name.strip_prefix("article_")
            .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
    }

    #[test]
    fn test_sanitize_replaces_separators() {
        assert_eq!(sanitize("Foo/Bar"), "Foo-Bar");
        assert_eq!(sanitize(r"C:\temp\x"), "C:-temp-x");
    }

    #[test]
    fn test_sanitize_removes_quotes() {
        assert_eq!(sanitize(r#"A "quoted" 'title'"#), "A quoted title");
    }

    #[test]
    fn test_sanitize_turns_line_breaks_into_spaces_and_trims() {
        assert_eq!(sanitize("  Line\none\t "), "Line one");
        assert_eq!(sanitize("Two\r\n  lines\u{0007}"), "Two lines");
    }

    #[test]
    fn test_sanitize_caps_long_titles() {
        let out = sanitize(&"a".repeat(250));
        assert_eq!(out.len(), MAX_STEM_BYTES);
    }

    #[test]
    fn test_sanitize_caps_multibyte_titles_on_char_boundary() {
        let out = sanitize(&"日本".repeat(100));
        assert!(out.len() <= MAX_STEM_BYTES);
        assert!(out.len() > MAX_STEM_BYTES - 3);
        assert!(out.chars().all(|c| c == '日' || c == '本'));
    }

    #[test]
    fn test_sanitize_cap_does_not_leave_trailing_space() {
        let raw = format!("{} tail", "b".repeat(MAX_STEM_BYTES));
        assert_eq!(sanitize(&raw), "b".repeat(MAX_STEM_BYTES));
        let raw = format!("{} {}", "c".repeat(MAX_STEM_BYTES - 1), "d".repeat(10));
        assert_eq!(sanitize(&raw), "c".repeat(MAX_STEM_BYTES - 1));
    }

    #[test]
    fn test_sanitize_never_contains_unsafe_characters() {
        for raw in ["a/b\\c\"d'e", "////", "\"'", "x/../y", "plain title"] {
            let out = sanitize(raw);
            assert!(
                !out.contains(['/', '\\', '"', '\'']),
                "unsafe character survived in {out:?}"
            );
        }
    }

    #[test]
    fn test_sanitize_empty_falls_back_to_timestamp_name() {
        assert!(is_fallback(&sanitize("")));
        assert!(is_fallback(&sanitize(r#"  "' "#)));
    }

    #[test]
    fn test_sanitize_dot_segments_fall_back() {
        assert!(is_fallback(&sanitize("..")));
        assert!(is_fallback(&sanitize(".")));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for raw in ["Foo/Bar", "It's fine", "  spaced  ", "Ünïcödé / títle"] {
            let once = sanitize(raw);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn test_run_names_suffixes_collisions() {
        let mut names = RunNames::new();
        assert_eq!(names.claim("Paper"), "Paper.pdf");
        assert_eq!(names.claim("Paper"), "Paper_2.pdf");
        assert_eq!(names.claim("Paper"), "Paper_3.pdf");
        assert_eq!(names.claim("Other"), "Other.pdf");
    }

    #[test]
    fn test_run_names_collisions_ignore_case() {
        let mut names = RunNames::new();
        assert_eq!(names.claim("paper"), "paper.pdf");
        assert_eq!(names.claim("PAPER"), "PAPER_2.pdf");
    }
}

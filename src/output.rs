//! Run summary rendering. Logs go to stderr; the summary is the only thing
//! written to stdout.

use std::path::Path;

use acmdl_core::{ArticleReference, DownloadResult, RunSummary};
use serde::Serialize;

/// One entry of the JSON report.
#[derive(Debug, Serialize)]
struct EntryReport<'a> {
    source_url: &'a str,
    #[serde(flatten)]
    result: &'a DownloadResult,
}

/// The JSON report.
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    query: &'a str,
    output_dir: &'a Path,
    cancelled: bool,
    discovered: usize,
    summary: RunSummary,
    results: Vec<EntryReport<'a>>,
}

/// Renders the summary as pretty JSON.
///
/// Results pair with `refs` positionally; a cancelled run has fewer results
/// than references.
pub fn render_json(
    query: &str,
    output_dir: &Path,
    refs: &[ArticleReference],
    results: &[DownloadResult],
    cancelled: bool,
) -> serde_json::Result<String> {
    let report = RunReport {
        query,
        output_dir,
        cancelled,
        discovered: refs.len(),
        summary: RunSummary::from_results(results),
        results: refs
            .iter()
            .zip(results)
            .map(|(reference, result)| EntryReport {
                source_url: &reference.source_url,
                result,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&report)
}

/// Renders the human-readable summary: one line per saved file, then totals.
#[must_use]
pub fn render_text(
    output_dir: &Path,
    refs: &[ArticleReference],
    results: &[DownloadResult],
    cancelled: bool,
) -> String {
    let summary = RunSummary::from_results(results);
    let mut lines = Vec::new();
    for result in results {
        if let DownloadResult::Saved { path, byte_size } = result {
            lines.push(format!("saved  {} ({})", path.display(), format_bytes(*byte_size)));
        }
    }
    if cancelled {
        lines.push(format!(
            "Cancelled after {} of {} articles",
            results.len(),
            refs.len()
        ));
    }
    lines.push(format!(
        "Saved {}, skipped {}, failed {} ({}) in {}",
        summary.saved,
        summary.skipped,
        summary.failed,
        format_bytes(summary.bytes_saved),
        output_dir.display()
    ));
    lines.join("\n")
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    let value = bytes as f64;
    if value >= MIB {
        format!("{:.1} MiB", value / MIB)
    } else if value >= KIB {
        format!("{:.1} KiB", value / KIB)
    } else {
        format!("{bytes} B")
    }
}

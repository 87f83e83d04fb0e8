//! Download Pipeline: resolve, fetch, validate, name, and save each article
//! in turn.
//!
//! Entries are processed strictly sequentially with a fixed pause between
//! them. Cancellation is checked at entry boundaries only; an in-flight
//! fetch runs to completion (or to its own timeout), but the pause between
//! entries ends as soon as cancellation is requested.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};

use crate::cancel::CancellationSignal;
use crate::download::{Fetch, RunNames, is_valid_pdf, sanitize, write_atomic};
use crate::model::{ArticleReference, DownloadResult, SkipReason};
use crate::resolver::{Resolution, Resolve};

/// Sequential orchestrator over a resolver and a fetcher.
pub struct DownloadPipeline {
    resolver: Arc<dyn Resolve>,
    fetcher: Arc<dyn Fetch>,
    output_dir: PathBuf,
    entry_delay: Duration,
}

impl DownloadPipeline {
    /// Creates a pipeline writing into `output_dir` and pausing
    /// `entry_delay` between consecutive entries.
    #[must_use]
    pub fn new(
        resolver: Arc<dyn Resolve>,
        fetcher: Arc<dyn Fetch>,
        output_dir: impl Into<PathBuf>,
        entry_delay: Duration,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            output_dir: output_dir.into(),
            entry_delay,
        }
    }

    /// Processes `refs` in order and returns one result per processed entry.
    ///
    /// Stops early, returning what has been accumulated, once `cancel` is
    /// signalled. Per-entry errors never abort the run.
    #[instrument(skip_all, fields(entries = refs.len(), output_dir = %self.output_dir.display()))]
    pub async fn run(
        &self,
        refs: &[ArticleReference],
        cancel: &CancellationSignal,
    ) -> Vec<DownloadResult> {
        let mut results = Vec::with_capacity(refs.len());
        let mut names = RunNames::new();

        for (index, reference) in refs.iter().enumerate() {
            if index > 0 && !self.entry_delay.is_zero() {
                tokio::select! {
                    () = tokio::time::sleep(self.entry_delay) => {}
                    () = cancel.cancelled() => {}
                }
            }
            if cancel.is_cancelled() {
                info!(
                    processed = results.len(),
                    remaining = refs.len() - index,
                    "cancelled; stopping before next article"
                );
                break;
            }

            info!(
                index = index + 1,
                total = refs.len(),
                url = %reference.source_url,
                "processing article"
            );
            let result = self.process(reference, &mut names).await;
            log_outcome(reference, &result);
            results.push(result);
        }

        results
    }

    async fn process(&self, reference: &ArticleReference, names: &mut RunNames) -> DownloadResult {
        let link = match self.resolver.resolve(reference).await {
            Resolution::Link(link) => link,
            Resolution::Verdict(verdict) => return verdict,
        };

        let fetched = match self.fetcher.fetch(&link.pdf_url).await {
            Ok(fetched) => fetched,
            Err(error) => return DownloadResult::failed(error.to_string()),
        };
        let bytes = fetched.bytes;

        let (bytes, valid) = match tokio::task::spawn_blocking(move || {
            let valid = is_valid_pdf(&bytes);
            (bytes, valid)
        })
        .await
        {
            Ok(checked) => checked,
            Err(join_error) => {
                return DownloadResult::failed(format!("PDF validation aborted: {join_error}"));
            }
        };
        if !valid {
            return DownloadResult::skipped(SkipReason::InvalidPdf);
        }

        let stem = sanitize(link.title.as_deref().unwrap_or_default());
        let file_name = names.claim(&stem);
        match write_atomic(&self.output_dir, &file_name, &bytes).await {
            Ok(path) => DownloadResult::Saved {
                path,
                byte_size: bytes.len() as u64,
            },
            Err(error) => DownloadResult::failed(error.to_string()),
        }
    }
}

impl std::fmt::Debug for DownloadPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadPipeline")
            .field("output_dir", &self.output_dir)
            .field("entry_delay", &self.entry_delay)
            .finish_non_exhaustive()
    }
}

fn log_outcome(reference: &ArticleReference, result: &DownloadResult) {
    let url = reference.source_url.as_str();
    match result {
        DownloadResult::Saved { path, byte_size } => {
            info!(url, path = %path.display(), bytes = byte_size, "saved");
        }
        DownloadResult::Skipped { reason } => warn!(url, %reason, "skipped"),
        DownloadResult::Failed { reason } => error!(url, %reason, "failed"),
    }
}

//! CLI argument definitions using clap derive macros, and their merge with
//! the config file.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use acmdl_core::config::{
    DEFAULT_BACKOFF_BASE_MS, DEFAULT_BASE_URL, DEFAULT_ENTRY_DELAY_SECS,
    DEFAULT_LOOKUP_TIMEOUT_SECS, DEFAULT_OUTPUT_DIR, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use acmdl_core::{ConfigError, FileConfig, RetryPolicy, SearchQuery};

/// Cap on a single retry backoff.
const MAX_BACKOFF: Duration = Duration::from_secs(32);
const BACKOFF_MULTIPLIER: f32 = 2.0;

/// Search the ACM Digital Library and download open-access PDFs.
///
/// Reads `config.toml` from the working directory when present; flags
/// override its values. Press Ctrl+C, or type `q` and Enter, to stop after
/// the current article.
#[derive(Parser, Debug)]
#[command(name = "acmdl")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Config file (default: ./config.toml if it exists)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Search query (overrides `query` in the config file)
    #[arg(long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Directory PDFs are saved to
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Pause between articles in seconds (0-3600)
    #[arg(short = 'd', long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(0..=3600))]
    pub delay: Option<u64>,

    /// Retries after the first failed fetch attempt (0-9)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub max_retries: Option<u8>,

    /// Stop after this many search results
    #[arg(long, value_name = "N")]
    pub max_articles: Option<usize>,

    /// Digital library origin
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Effective settings after merging flags over the config file over defaults.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub query: SearchQuery,
    pub output_dir: PathBuf,
    pub base_url: String,
    pub entry_delay: Duration,
    pub retry_policy: RetryPolicy,
    pub lookup_timeout: Duration,
    pub request_timeout: Duration,
    pub max_articles: Option<usize>,
}

impl RunSettings {
    /// Merges `args` over `file`, validates the result, and fills unset
    /// values with the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a flag (or a file value it did
    /// not override) is out of range.
    pub fn resolve(args: &Args, file: &FileConfig) -> Result<Self, ConfigError> {
        let merged = FileConfig {
            query: args.query.clone().or_else(|| file.query.clone()),
            output_dir: args.output_dir.clone().or_else(|| file.output_dir.clone()),
            base_url: args.base_url.clone().or_else(|| file.base_url.clone()),
            entry_delay_secs: args.delay.or(file.entry_delay_secs),
            max_attempts: args
                .max_retries
                .map(|retries| u32::from(retries) + 1)
                .or(file.max_attempts),
            max_articles: args.max_articles.or(file.max_articles),
            ..file.clone()
        };
        merged.validate()?;

        let backoff_base =
            Duration::from_millis(merged.backoff_base_ms.unwrap_or(DEFAULT_BACKOFF_BASE_MS));
        let retry_policy = RetryPolicy::new(
            merged.max_attempts_or_default(),
            backoff_base,
            MAX_BACKOFF,
            BACKOFF_MULTIPLIER,
        )
        .with_retryable_statuses(merged.retryable_statuses_or_default());

        Ok(Self {
            query: SearchQuery::new(merged.query_or_default()),
            output_dir: merged
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            base_url: merged
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            entry_delay: Duration::from_secs(
                merged.entry_delay_secs.unwrap_or(DEFAULT_ENTRY_DELAY_SECS),
            ),
            retry_policy,
            lookup_timeout: Duration::from_secs(
                merged
                    .lookup_timeout_secs
                    .unwrap_or(DEFAULT_LOOKUP_TIMEOUT_SECS),
            ),
            request_timeout: Duration::from_secs(
                merged
                    .request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            max_articles: merged.max_articles,
        })
    }
}

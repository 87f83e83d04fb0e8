//! CLI entry point for the ACM Digital Library harvester.

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::Arc;

use acmdl_core::cancel::spawn_interrupt_listeners;
use acmdl_core::download::remove_stale_parts;
use acmdl_core::{
    CancellationSignal, DownloadPipeline, FileConfig, HttpClient, HttpPageSource, HttpSettings,
    LinkResolver, PageSource, RunSummary, enumerate_articles,
};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};

mod cli;
mod output;

use cli::{Args, RunSettings};

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    /// Nothing failed (skips are not failures).
    Success,
    /// Some entries failed, at least one was saved.
    Partial,
    /// Every attempted entry failed, or the run aborted.
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(outcome: ProcessExit) -> Self {
        match outcome {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Partial => ExitCode::from(2),
            ProcessExit::Failure => ExitCode::FAILURE,
        }
    }
}

/// Maps saved/failed counts to the process exit outcome.
fn determine_exit_outcome(summary: &RunSummary) -> ProcessExit {
    if summary.failed == 0 {
        ProcessExit::Success
    } else if summary.saved > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    init_tracing(&args);
    debug!(?args, "CLI arguments parsed");

    match run(args).await {
        Ok(outcome) => outcome.into(),
        Err(error) => {
            error!("{error:#}");
            ProcessExit::Failure.into()
        }
    }
}

/// Priority: `RUST_LOG` env var > quiet flag > verbose flag > default (info).
/// Logs go to stderr so stdout carries only the summary.
fn init_tracing(args: &Args) {
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(args: Args) -> Result<ProcessExit> {
    let file_config =
        FileConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let settings =
        RunSettings::resolve(&args, &file_config).context("Invalid settings")?;
    info!(
        query = %settings.query.text(),
        output_dir = %settings.output_dir.display(),
        "acmdl starting"
    );

    tokio::fs::create_dir_all(&settings.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create output directory '{}'",
                settings.output_dir.display()
            )
        })?;
    match remove_stale_parts(&settings.output_dir).await {
        Ok(0) => {}
        Ok(removed) => info!(removed, "removed partial files from an interrupted run"),
        Err(cleanup_error) => warn!(error = %cleanup_error, "could not remove partial files"),
    }

    let pages = Arc::new(HttpPageSource::new().context("Failed to build page client")?);
    let http_settings = HttpSettings {
        request_timeout: settings.request_timeout,
        head_timeout: settings.lookup_timeout,
        ..HttpSettings::default()
    };
    let client = HttpClient::new(http_settings, settings.retry_policy.clone())
        .context("Failed to build HTTP client")?;
    let resolver = Arc::new(LinkResolver::new(
        pages.clone(),
        client.clone(),
        settings.lookup_timeout,
    ));
    let pipeline = DownloadPipeline::new(
        resolver,
        Arc::new(client),
        settings.output_dir.clone(),
        settings.entry_delay,
    );

    let cancel = CancellationSignal::new();
    spawn_interrupt_listeners(&cancel, io::stdin().is_terminal());

    let refs = match enumerate_articles(
        pages.as_ref(),
        &settings.query,
        &settings.base_url,
        settings.max_articles,
    )
    .await
    {
        Ok(refs) => refs,
        Err(search_error) => {
            pages.close().await;
            return Err(search_error).context("Search failed");
        }
    };

    let results = pipeline.run(&refs, &cancel).await;
    pages.close().await;

    let cancelled = cancel.is_cancelled() && results.len() < refs.len();
    let summary = RunSummary::from_results(&results);
    info!(
        saved = summary.saved,
        skipped = summary.skipped,
        failed = summary.failed,
        total = summary.total(),
        "Run complete"
    );

    let rendered = if args.json {
        output::render_json(
            settings.query.text(),
            &settings.output_dir,
            &refs,
            &results,
            cancelled,
        )
        .context("Failed to render JSON summary")?
    } else {
        output::render_text(&settings.output_dir, &refs, &results, cancelled)
    };
    if !args.quiet || args.json {
        println!("{rendered}");
    }

    Ok(determine_exit_outcome(&summary))
}

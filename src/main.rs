//! CLI entry point for the knowledge-base exporter.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use kb_export_core::{
    Credential, ExportOptions, ExportReport, ExportRequest, RateLimiter, RetryingFetcher,
    ServiceEndpoints, export_catalog,
};
use tracing::{debug, info};

mod app_config;
mod cli;
mod exit_handler;

use app_config::RuntimeSettings;
use cli::{Args, COOKIE_ENV_VAR};
use exit_handler::{ProcessExit, determine_exit_outcome};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    match run(args).await {
        Ok(outcome) => outcome.into(),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ProcessExit::Failure.into()
        }
    }
}

async fn run(args: Args) -> Result<ProcessExit> {
    let file_config = app_config::load_config(args.config.as_deref())?;
    let settings = RuntimeSettings::resolve(&args, file_config.as_ref());

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(settings.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, ?settings, "CLI arguments resolved");
    info!(book_id = %args.book_id, namespace = %args.namespace, "Exporter starting");

    let credential = resolve_credential(&args)?;
    let endpoints = ServiceEndpoints::new(&settings.service_base)?;

    let rate_limiter = if settings.rate_limit.is_zero() {
        debug!("rate limiting disabled");
        RateLimiter::disabled()
    } else {
        RateLimiter::new(settings.rate_limit)
    };
    let fetcher = RetryingFetcher::with_timeouts(
        rate_limiter,
        settings.retry_policy,
        settings.connect_timeout_secs,
        settings.read_timeout_secs,
    )
    .context("Failed to build HTTP client")?;

    let request = ExportRequest::new(args.book_id, args.namespace, settings.output_dir)
        .with_credential(credential)
        .with_options(ExportOptions {
            refresh: args.refresh,
        });

    let report = export_catalog(&fetcher, &endpoints, &request).await?;
    print_summary(&report);

    Ok(determine_exit_outcome(report.exported(), report.failed()))
}

/// First match wins: `--cookie`, `--cookie-file`, `$KB_EXPORT_COOKIE`, none.
fn resolve_credential(args: &Args) -> Result<Credential> {
    if let Some(raw) = &args.cookie {
        debug!("using cookie from command line");
        return Credential::new(raw).context("Invalid --cookie value");
    }

    if let Some(path) = &args.cookie_file {
        debug!(path = %path.display(), "using cookie export file");
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cookie file '{}'", path.display()))?;
        return Credential::from_cookie_export(&json)
            .with_context(|| format!("Invalid cookie file '{}'", path.display()));
    }

    if let Ok(raw) = std::env::var(COOKIE_ENV_VAR) {
        debug!("using cookie from {COOKIE_ENV_VAR}");
        return Credential::new(&raw)
            .with_context(|| format!("Invalid {COOKIE_ENV_VAR} value"));
    }

    debug!("no credential configured, sending requests without a cookie");
    Ok(Credential::none())
}

fn print_summary(report: &ExportReport) {
    for failure in report.failures() {
        eprintln!(
            "  not exported: {} [{}]: {}",
            failure.title, failure.id, failure.cause
        );
    }

    println!(
        "Exported {} document(s): {} saved, {} already present, {} failed",
        report.exported(),
        report.saved(),
        report.skipped(),
        report.failed()
    );
}

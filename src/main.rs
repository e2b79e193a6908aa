// src/main.rs

// Modules defined in the crate
mod api;
mod config;
mod constants;
mod error;
mod error_recovery;
mod types;

// Specific imports
use crate::api::{CatalogFetcher, FetchResult, Item};
use crate::config::{CatalogConfig, CommandLineInput};
use crate::error::AppError;
use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;

/// Sets up logging configuration.
///
/// The console appender writes to stderr; stdout carries the JSON result.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("catalog_fetch.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stderr_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Fetches the configured collection, writes it out and reports on stderr.
async fn execute_fetch(config: &CatalogConfig) -> Result<(), AppError> {
    let fetcher = CatalogFetcher::from_config(config)?;
    let result = fetcher.fetch(config.filters.clone()).await?;

    deliver_items(config, &result.data)?;
    report_completion(config, &fetcher, &result);
    Ok(())
}

/// Writes items as pretty JSON to the output file, or to stdout.
fn deliver_items(config: &CatalogConfig, items: &[Item]) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(items)?;

    match &config.output_file {
        Some(path) => fs::write(path, json).map_err(|e| AppError::InternalError {
            message: format!("Failed to write {}: {}", path.display(), e),
            source: Some(Box::new(e)),
        }),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

/// One-line summary on stderr, plus a warning when pages were lost.
fn report_completion(
    config: &CatalogConfig,
    fetcher: &CatalogFetcher,
    result: &FetchResult<Vec<Item>>,
) {
    let metadata = &result.metadata;

    eprintln!(
        "Fetched {} items from {} ({} requests, {} parameter sets).",
        result.data.len(),
        fetcher.path(),
        metadata.requests,
        metadata.param_sets
    );

    if fetcher.config().is_parallel() && config.fetch.max_items.is_some() {
        eprintln!("Note: --max-items is not applied with more than one thread.");
    }

    if metadata.is_degraded() {
        eprintln!(
            "⚠️  {} filter(s) rejected and {} page(s) timed out; results may be incomplete.",
            metadata.filters_rejected, metadata.retries_exhausted
        );
    }

    if let Some(path) = &config.output_file {
        eprintln!("✓ Items saved to {}", path.display());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialize logging")?;

    let config = CatalogConfig::resolve(cli).context("invalid configuration")?;

    execute_fetch(&config)
        .await
        .with_context(|| format!("fetching {} failed", config.path))?;

    Ok(())
}

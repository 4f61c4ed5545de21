//! Gleaner main entry point
//!
//! Command-line interface for the gleaner single-site crawler: loads a TOML
//! configuration, runs the crawl, and prints every yielded URL to stdout.
//! Per-page failures are logged and never stop the crawl.

use anyhow::Context;
use clap::Parser;
use gleaner::config::load_config_with_hash;
use gleaner::Crawler;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gleaner: a single-site, depth-bounded web crawler
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version)]
#[command(about = "A single-site, depth-bounded web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discard persisted pending entries and start from the seed URL
    #[arg(long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    let mut crawler = Crawler::from_config(&config)?;

    if cli.fresh {
        tracing::info!("Starting fresh crawl (discarding pending entries)");
        crawler.clear_state()?;
    }

    tracing::info!(
        "Crawler {} starting at {} (max depth {})",
        crawler.id(),
        crawler.seed_url(),
        config.crawler.max_depth
    );

    let (mut urls, mut errors) = crawler.start(config.crawler.max_depth);

    let mut yielded: u64 = 0;
    let mut failed: u64 = 0;

    loop {
        tokio::select! {
            url = urls.recv() => match url {
                Some(url) => {
                    yielded += 1;
                    println!("{}", url);
                }
                None => break,
            },
            Some(err) = errors.recv() => {
                failed += 1;
                tracing::warn!("{}", err);
            }
        }
    }

    // The producer is gone; drain any errors still queued
    while let Some(err) = errors.recv().await {
        failed += 1;
        tracing::warn!("{}", err);
    }

    tracing::info!(
        "Crawl finished: {} URLs yielded, {} branches abandoned",
        yielded,
        failed
    );

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gleaner=info,warn"),
            1 => EnvFilter::new("gleaner=debug,info"),
            2 => EnvFilter::new("gleaner=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

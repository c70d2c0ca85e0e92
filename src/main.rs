//! Product-Ripple main entry point
//!
//! This is the command-line interface for the Product-Ripple catalogue crawler.

use anyhow::Context;
use clap::Parser;
use product_ripple::config::{load_config_with_hash, CrawlConfig};
use product_ripple::crawler::run_crawl;
use product_ripple::output::{print_summary, ChannelSink, CrawlEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Product-Ripple: a product catalogue crawler
///
/// Product-Ripple crawls a shop from a seed URL, follows links inside the
/// seed's domain and writes every product it finds to a CSV file.
#[derive(Parser, Debug)]
#[command(name = "product-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A product catalogue crawler", long_about = None)]
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

    /// Validate config and show the effective settings without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("product_ripple=info,warn"),
            1 => EnvFilter::new("product_ripple=debug,info"),
            2 => EnvFilter::new("product_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: prints the effective configuration
fn handle_dry_run(config: &CrawlConfig) {
    println!("=== Product-Ripple Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!("  Mode: {}", config.crawler.mode);
    println!(
        "  Product identifier: {:?}",
        config.crawler.product_identifier
    );
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Timeout: {}s", config.crawler.timeout_secs);
    println!(
        "  Retries: {} (backoff unit {}ms)",
        config.crawler.max_retries, config.crawler.backoff_base_ms
    );
    match config.crawler.max_duration_secs {
        Some(secs) => println!("  Time limit: {}s", secs),
        None => println!("  Time limit: none"),
    }

    println!("\nSelectors:");
    let selectors = &config.selectors;
    for (field, token) in [
        ("name", &selectors.name),
        ("sku", &selectors.sku),
        ("price", &selectors.price),
        ("description", &selectors.description),
        ("image", &selectors.image),
    ] {
        if token.is_empty() {
            println!("  {}: itemprop", field);
        } else {
            println!("  {}: class {:?}", field, token);
        }
    }

    println!("\nBlacklist ({}):", config.filter.blacklist.len());
    for entry in &config.filter.blacklist {
        println!("  - {}", entry);
    }

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
///
/// Ctrl-C fires the stop signal; the batch in flight is finished and written
/// before the crawler returns.
async fn handle_crawl(config: CrawlConfig, quiet: bool) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing current batch");
                cancel.cancel();
            }
        })
    };

    // Log lines already reach the terminal through tracing; only the status
    // line (debug level there) is printed here.
    let (sink, mut events) = ChannelSink::new();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                CrawlEvent::Progress(snapshot) if !quiet => println!("{}", snapshot.status_line()),
                CrawlEvent::Finished(_) => break,
                _ => {}
            }
        }
    });

    let result = run_crawl(config, Arc::new(sink), cancel).await;
    ctrl_c.abort();

    // Finished is the last event; a failed run drops the sink instead.
    printer.await.context("Event printer task failed")?;

    let summary = result.context("Crawl failed")?;
    if !quiet {
        println!();
        print_summary(&summary);
    }

    Ok(())
}

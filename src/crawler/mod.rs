//! Crawler module for page fetching and product extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Link discovery and filtering
//! - Product extraction (JSON-LD or HTML heuristics)
//! - Frontier bookkeeping and batch dispatch

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod links;

pub use coordinator::{run_crawl, Coordinator};
pub use extractor::extract_product;
pub use fetcher::{
    build_http_client, fetch_url, FetchOutcome, FetchPolicy, HttpFetcher, PageFetcher, USER_AGENT,
};
pub use frontier::Frontier;
pub use links::{discover_links, extract_links};

use crate::config::CrawlConfig;
use crate::output::{CrawlSummary, NullSink};
use crate::RippleError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl without progress reporting
///
/// This is the shortest way to run a crawl. It will:
/// 1. Validate the seed URL
/// 2. Create the CSV file
/// 3. Crawl until the frontier is empty or `max-duration-secs` elapses
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed
/// * `Err(RippleError)` - Crawl could not start or the CSV file failed
pub async fn crawl(config: CrawlConfig) -> Result<CrawlSummary, RippleError> {
    run_crawl(config, Arc::new(NullSink), CancellationToken::new()).await
}

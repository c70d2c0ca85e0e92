//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator pulls batches of URLs from the frontier, runs the
//! fetch → parse → extract → discover pipeline for a whole batch
//! concurrently, then applies the results (rows, new links, progress) before
//! dispatching the next batch. Frontier and sink are only touched between
//! batches, so no locking is needed.

use crate::config::{validate_seed_url, CrawlConfig};
use crate::crawler::extractor::extract_product;
use crate::crawler::fetcher::{FetchPolicy, HttpFetcher, PageFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::links::discover_links;
use crate::output::{
    CrawlLog, CrawlSummary, CsvSink, ProductRecord, ProductSink, ProgressSink, ProgressSnapshot,
};
use crate::state::UrlState;
use crate::url::LinkFilter;
use crate::{ConfigError, RippleError};
use futures::future::join_all;
use scraper::Html;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// What one unit of work produced
#[derive(Debug)]
struct PageResult {
    url: Url,
    fetched: bool,
    product_page: bool,
    product: Option<ProductRecord>,
    links: HashSet<Url>,
}

/// Running counters for the summary
#[derive(Debug, Default)]
struct RunCounters {
    fetched: u64,
    failed: u64,
    products: u64,
    product_pages_without_record: u64,
}

/// Main crawler coordinator structure
///
/// One coordinator drives one crawl; [`Coordinator::run`] consumes it.
pub struct Coordinator<F, S> {
    config: CrawlConfig,
    seed: Url,
    filter: LinkFilter,
    frontier: Frontier,
    fetcher: F,
    sink: S,
    log: CrawlLog,
    cancel: CancellationToken,
    counters: RunCounters,
}

impl<F: PageFetcher, S: ProductSink> Coordinator<F, S> {
    /// Creates a new coordinator with the seed URL already pending
    ///
    /// # Arguments
    ///
    /// * `config` - Settings for this run
    /// * `fetcher` - Source of page bodies
    /// * `sink` - Receives product rows
    /// * `log` - Logger handle for status lines
    /// * `cancel` - Stop signal, checked between batches
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(RippleError::Config)` - The seed URL is unusable
    pub fn new(
        config: CrawlConfig,
        fetcher: F,
        sink: S,
        log: CrawlLog,
        cancel: CancellationToken,
    ) -> Result<Self, RippleError> {
        let seed = match validate_seed_url(&config.crawler.seed_url) {
            Ok(seed) => seed,
            Err(e) => {
                log.error(format!("Invalid URL. Please provide a valid URL. ({})", e));
                return Err(e.into());
            }
        };

        let scope = seed
            .host_str()
            .ok_or_else(|| ConfigError::InvalidUrl(format!("Seed URL '{}' has no host", seed)))?
            .to_string();
        let filter = LinkFilter::new(scope, &config.filter.blacklist);

        let mut frontier = Frontier::new();
        frontier.admit(seed.clone());

        Ok(Self {
            config,
            seed,
            filter,
            frontier,
            fetcher,
            sink,
            log,
            cancel,
            counters: RunCounters::default(),
        })
    }

    /// Runs the main crawl loop until the frontier is exhausted or the stop
    /// signal is observed
    ///
    /// A batch that is already in flight when the signal fires is finished
    /// and its rows are written.
    pub async fn run(mut self) -> Result<CrawlSummary, RippleError> {
        let started_at = chrono::Utc::now();
        let start_time = Instant::now();
        let concurrency = self.config.crawler.concurrency.max(1);

        self.log.info("Starting crawl ...");
        tracing::info!(
            "Seed: {}, mode: {}, scope: {}, concurrency: {}",
            self.seed,
            self.config.crawler.mode,
            self.filter.scope_domain(),
            concurrency
        );

        let timer = self.spawn_duration_limit();
        let outcome = self.crawl_batches(concurrency).await;

        // The timer task holds a log handle and keeps the progress channel
        // open; it is torn down on the error path as well.
        if let Some(timer) = timer {
            timer.abort();
            let _ = timer.await;
        }
        let cancelled = outcome?;

        let summary = CrawlSummary {
            seed_url: self.seed.to_string(),
            started_at: started_at.to_rfc3339(),
            finished_at: chrono::Utc::now().to_rfc3339(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
            cancelled,
            pages_visited: self.frontier.visited_len() as u64,
            pages_left_pending: self.frontier.pending_len() as u64,
            pages_fetched: self.counters.fetched,
            pages_failed: self.counters.failed,
            products_written: self.counters.products,
            product_pages_without_record: self.counters.product_pages_without_record,
        };

        if cancelled {
            self.log.info(format!(
                "Crawl stopped. {} products from {} pages.",
                summary.products_written, summary.pages_visited
            ));
        } else {
            self.log.info(format!(
                "Crawl finished. {} products from {} pages.",
                summary.products_written, summary.pages_visited
            ));
        }
        self.log.finished(summary.clone());

        Ok(summary)
    }

    /// Dispatches batches until the frontier is empty or the stop signal is
    /// seen; returns true in the latter case
    async fn crawl_batches(&mut self, concurrency: usize) -> Result<bool, RippleError> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(true);
            }

            if self.frontier.is_exhausted() {
                return Ok(false);
            }

            let batch = self.frontier.next_batch(concurrency);
            tracing::debug!("Dispatching batch of {} URLs", batch.len());

            let results = join_all(batch.iter().map(|url| self.process_url(url))).await;

            for result in results {
                self.apply(result)?;
            }
            self.sink.flush()?;
        }
    }

    /// Fetches one page and derives everything the coordinator needs from it
    ///
    /// The body is parsed once; the same document feeds product extraction
    /// and link discovery.
    async fn process_url(&self, url: &Url) -> PageResult {
        let mut result = PageResult {
            url: url.clone(),
            fetched: false,
            product_page: false,
            product: None,
            links: HashSet::new(),
        };

        let Some(body) = self.fetcher.fetch(url, &self.log).await.into_body() else {
            return result;
        };
        result.fetched = true;

        let document = Html::parse_document(&body);

        if url.as_str().contains(&self.config.crawler.product_identifier) {
            result.product_page = true;
            result.product = extract_product(
                &document,
                self.config.crawler.mode,
                &self.config.selectors,
                url,
                &self.log,
            );
        }

        result.links = discover_links(&document, url, &self.filter, &self.log);
        result
    }

    /// Writes the product row, admits new links and reports progress
    fn apply(&mut self, result: PageResult) -> Result<(), RippleError> {
        if result.fetched {
            self.counters.fetched += 1;
        } else {
            self.counters.failed += 1;
        }

        let outcome = match &result.product {
            Some(record) => {
                self.sink.write(record)?;
                self.counters.products += 1;
                Some(UrlState::ProductExtracted)
            }
            None if result.fetched => {
                if result.product_page {
                    self.counters.product_pages_without_record += 1;
                }
                Some(UrlState::LinksOnly)
            }
            None => None,
        };

        if let Some(outcome) = outcome {
            if self.frontier.complete(&result.url, outcome) {
                tracing::trace!("{} is {}", result.url, outcome);
            }
        }

        let admitted = self.frontier.admit_all(result.links);
        tracing::trace!("{} new URLs from {}", admitted, result.url);

        self.log.progress(ProgressSnapshot {
            visited: self.frontier.visited_len(),
            pending: self.frontier.pending_len(),
            products: self.counters.products,
        });

        Ok(())
    }

    /// Fires the stop signal once `max-duration-secs` has passed
    fn spawn_duration_limit(&self) -> Option<tokio::task::JoinHandle<()>> {
        let secs = self.config.crawler.max_duration_secs?;
        let cancel = self.cancel.clone();
        let log = self.log.clone();

        Some(tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                    log.info(format!("Time limit of {}s reached, stopping crawl", secs));
                    cancel.cancel();
                }
                _ = cancel.cancelled() => {}
            }
        }))
    }
}

/// Runs a complete crawl with the HTTP fetcher and a CSV sink
///
/// This function:
/// 1. Validates the seed URL (no file is touched if it is invalid)
/// 2. Creates the CSV file and writes its header
/// 3. Builds the HTTP client
/// 4. Runs the coordinator until the frontier is empty or `cancel` fires
///
/// # Example
///
/// ```no_run
/// use product_ripple::config::load_config;
/// use product_ripple::crawler::run_crawl;
/// use product_ripple::output::NullSink;
/// use std::path::Path;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawl.toml"))?;
/// let summary = run_crawl(config, Arc::new(NullSink), CancellationToken::new()).await?;
/// println!("{} products", summary.products_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: CrawlConfig,
    progress: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
) -> Result<CrawlSummary, RippleError> {
    let log = CrawlLog::new(progress);

    if let Err(e) = validate_seed_url(&config.crawler.seed_url) {
        log.error(format!("Invalid URL. Please provide a valid URL. ({})", e));
        return Err(e.into());
    }

    let sink = CsvSink::create(Path::new(&config.output.csv_path))?;
    tracing::info!("Writing products to {}", sink.path().display());

    let policy = FetchPolicy {
        timeout: config.crawler.timeout(),
        max_retries: config.crawler.max_retries,
        backoff_base: config.crawler.backoff_base(),
    };
    let fetcher = HttpFetcher::new(policy, cancel.clone())?;

    Coordinator::new(config, fetcher, sink, log, cancel)?
        .run()
        .await
}

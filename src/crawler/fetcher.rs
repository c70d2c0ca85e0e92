//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with a desktop browser user agent
//! - GET requests to fetch page content
//! - Retry with exponential backoff for timeouts
//! - Outcome classification

use crate::output::CrawlLog;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// User agent sent with every request
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Result of one fetch, after all retries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Page body of a 2xx response
    Body(String),

    /// HTTP 403
    Denied,

    /// Any other non-2xx status
    HttpError(u16),

    /// Every attempt timed out
    Timeout,

    /// Connection refused, DNS failure, TLS failure
    ConnectionError(String),

    /// Anything else that went wrong
    Failed(String),

    /// The stop signal fired while waiting to retry
    Cancelled,
}

impl FetchOutcome {
    /// Returns the body if the fetch succeeded
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Body(body) => Some(body),
            _ => None,
        }
    }
}

/// Timeout and retry settings for a fetcher
#[derive(Debug, Clone, Copy)]
pub struct FetchPolicy {
    /// Per-attempt request timeout
    pub timeout: Duration,

    /// Number of attempts when requests time out
    pub max_retries: u32,

    /// Backoff unit; attempt `n` is followed by a sleep of `base * 2^(n-1)`
    pub backoff_base: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl FetchPolicy {
    /// Delay before the attempt following `attempt` (1-based)
    ///
    /// Saturates at `Duration::MAX` instead of overflowing.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt.saturating_sub(1))
            .and_then(|factor| self.backoff_base.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

/// Source of page bodies for the coordinator
///
/// [`HttpFetcher`] is the real implementation; tests plug in counting or
/// canned fetchers.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    /// Fetches one URL, reporting terminal failures to `log`
    async fn fetch(&self, url: &Url, log: &CrawlLog) -> FetchOutcome;
}

impl<T: PageFetcher + ?Sized> PageFetcher for &T {
    async fn fetch(&self, url: &Url, log: &CrawlLog) -> FetchOutcome {
        (**self).fetch(url, log).await
    }
}

/// Fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    policy: FetchPolicy,
    cancel: CancellationToken,
}

impl HttpFetcher {
    /// Creates a fetcher; `cancel` interrupts backoff sleeps between retries
    pub fn new(policy: FetchPolicy, cancel: CancellationToken) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(policy.timeout)?,
            policy,
            cancel,
        })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, log: &CrawlLog) -> FetchOutcome {
        fetch_url(&self.client, url, &self.policy, &self.cancel, log).await
    }
}

/// Builds an HTTP client with the browser user agent and request timeout
///
/// # Arguments
///
/// * `timeout` - Timeout for a whole request (connect plus body)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with retry and backoff
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Body |
/// | HTTP 403 | Immediate → Denied |
/// | Other non-2xx | Immediate → HttpError |
/// | Timeout | Sleep `base * 2^(attempt-1)`, retry up to `max_retries` attempts, then Timeout |
/// | Connection error | Immediate → ConnectionError |
/// | Anything else | Immediate → Failed |
///
/// The stop signal is only honored during backoff sleeps; a request that is
/// already on the wire runs to completion.
pub async fn fetch_url(
    client: &Client,
    url: &Url,
    policy: &FetchPolicy,
    cancel: &CancellationToken,
    log: &CrawlLog,
) -> FetchOutcome {
    let attempts = policy.max_retries.max(1);

    for attempt in 1..=attempts {
        let error = match client.get(url.clone()).send().await {
            Ok(response) => {
                let status = response.status();

                if status == StatusCode::FORBIDDEN {
                    log.error(format!("Access denied: 403 Forbidden for {}", url));
                    return FetchOutcome::Denied;
                }

                if !status.is_success() {
                    log.error(format!(
                        "Non-2xx status code {} ({}) for {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("unknown"),
                        url
                    ));
                    return FetchOutcome::HttpError(status.as_u16());
                }

                match response.text().await {
                    Ok(body) => return FetchOutcome::Body(body),
                    Err(e) => e,
                }
            }
            Err(e) => e,
        };

        if error.is_timeout() {
            log.warn(format!(
                "Timeout error for {} on attempt {}/{}",
                url, attempt, attempts
            ));

            if attempt == attempts {
                break;
            }

            let delay = policy.backoff_delay(attempt);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => {
                    log.warn(format!("Gave up retrying {}: crawl stopped", url));
                    return FetchOutcome::Cancelled;
                }
            }
            continue;
        }

        if error.is_connect() {
            log.error(format!("Connection error for {}: {}", url, error));
            return FetchOutcome::ConnectionError(error.to_string());
        }

        log.error(format!("Unexpected error fetching {}: {}", url, error));
        return FetchOutcome::Failed(error.to_string());
    }

    log.error(format!(
        "Failed to fetch {} after {} attempts due to timeout.",
        url, attempts
    ));
    FetchOutcome::Timeout
}

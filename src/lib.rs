//! Product-Ripple: a product catalogue crawler
//!
//! This crate crawls a website from a seed URL, follows internal links and
//! extracts product records (from JSON-LD markup or from the page HTML) into
//! a CSV file.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Product-Ripple operations
#[derive(Debug, Error)]
pub enum RippleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTML parse error for {url}: {message}")]
    HtmlParse { url: String, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Product-Ripple operations
pub type Result<T> = std::result::Result<T, RippleError>;

// Re-export commonly used types
pub use config::{CrawlConfig, CrawlMode};
pub use crawler::{Coordinator, FetchOutcome, PageFetcher};
pub use output::{CrawlEvent, CrawlLog, ProductRecord, ProgressSink, ProgressSnapshot};
pub use state::UrlState;
pub use url::{normalize_url, LinkFilter};

//! Configuration module for Product-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use product_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawl starts at {}", config.crawler.seed_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    parse_blacklist_text, CrawlConfig, CrawlMode, CrawlerConfig, FilterConfig, OutputConfig,
    SelectorConfig, DEFAULT_BLACKLIST,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_seed_url};

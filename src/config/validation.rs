use crate::config::types::{CrawlConfig, CrawlerConfig, OutputConfig};
use crate::url::normalize_url;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_seed_url(&config.seed_url)?;

    if config.concurrency < 1 || config.concurrency > 500 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 500, got {}",
            config.concurrency
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.max_retries < 1 || config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be between 1 and 10, got {}",
            config.max_retries
        )));
    }

    if config.backoff_base_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "backoff_base_ms must be <= 60000, got {}",
            config.backoff_base_ms
        )));
    }

    if config.max_duration_secs == Some(0) {
        return Err(ConfigError::Validation(
            "max_duration_secs must be > 0 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "csv_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that the seed URL is an absolute http(s) URL with a host
///
/// Returns the normalized URL so callers don't parse it twice.
pub fn validate_seed_url(seed: &str) -> Result<Url, ConfigError> {
    normalize_url(seed).map_err(|e| ConfigError::InvalidUrl(format!("Seed URL '{}': {}", seed, e)))
}

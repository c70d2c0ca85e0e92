use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Stock blacklist used when the configuration does not provide one
pub const DEFAULT_BLACKLIST: &[&str] = &[
    "/account",
    "/agbs",
    "/agb",
    "/cart",
    "/impressum",
    "/kontakt",
    "/contact",
    "/datenschutz",
    "/über-uns",
    "/ueber-uns",
    "/de/de/",
    "/en",
];

/// Main configuration structure for one crawl run
///
/// Built once (usually from a TOML file) and never mutated afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// How product data is located on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    /// Embedded JSON-LD `Product` markup
    #[serde(alias = "json")]
    Structured,
    /// Class tokens or `itemprop` attributes in the HTML
    #[serde(alias = "html")]
    Heuristic,
}

impl std::fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URL the crawl starts from; its host is the crawl scope
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    pub mode: CrawlMode,

    /// Substring a URL must contain for its page to be mined for a product
    #[serde(rename = "product-identifier", default)]
    pub product_identifier: String,

    /// Maximum number of fetches in one batch
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per URL when requests time out
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff time unit between timed-out attempts (milliseconds)
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Stop the crawl after this many seconds
    #[serde(rename = "max-duration-secs", default)]
    pub max_duration_secs: Option<u64>,
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

/// Class tokens for heuristic extraction; an empty token means "use itemprop"
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectorConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

/// Link filtering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Substrings that exclude a URL; accepts an array or a newline-separated block
    #[serde(default = "default_blacklist", deserialize_with = "deserialize_blacklist")]
    pub blacklist: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            blacklist: default_blacklist(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the CSV file, recreated on every run
    #[serde(rename = "csv-path", default = "default_csv_path")]
    pub csv_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
        }
    }
}

/// Splits a multi-line blacklist block into trimmed, non-empty entries
pub fn parse_blacklist_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn deserialize_blacklist<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawBlacklist {
        List(Vec<String>),
        Text(String),
    }

    Ok(match RawBlacklist::deserialize(deserializer)? {
        RawBlacklist::List(entries) => entries
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect(),
        RawBlacklist::Text(text) => parse_blacklist_text(&text),
    })
}

fn default_concurrency() -> usize {
    50
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_blacklist() -> Vec<String> {
    DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect()
}

fn default_csv_path() -> String {
    "scraped_products.csv".to_string()
}

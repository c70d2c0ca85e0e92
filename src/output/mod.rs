//! Output module for crawl results
//!
//! This module handles:
//! - The product record type and the CSV sink rows are written to
//! - The progress/log channel the caller subscribes to
//! - End-of-run summaries

mod csv_output;
mod progress;
pub mod stats;
mod traits;

pub use csv_output::CsvSink;
pub use progress::{ChannelSink, CrawlEvent, CrawlLog, NullSink, ProgressSink, ProgressSnapshot};
pub use stats::{format_summary, print_summary};
pub use traits::{
    decimal_comma, CrawlSummary, FieldValue, OutputError, OutputResult, ProductRecord,
    ProductSink, PRODUCT_COLUMNS,
};

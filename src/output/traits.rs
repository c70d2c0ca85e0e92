//! Output sink traits and types
//!
//! This module defines the product sink interface and the data structures
//! written to it, plus the end-of-run summary.

use std::fmt;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Column names of the product table, in write order
pub const PRODUCT_COLUMNS: [&str; 6] = ["name", "image", "desc", "sku", "price", "url"];

/// Value of one extracted product field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldValue {
    /// Nothing was present
    #[default]
    Empty,

    /// Extracted value
    Found(String),

    /// The expected element was missing; holds the placeholder written instead
    NotFound(String),
}

impl FieldValue {
    /// Wraps an extracted string; blank strings become `Empty`
    pub fn found(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::Empty
        } else {
            Self::Found(value)
        }
    }

    pub fn not_found(placeholder: impl Into<String>) -> Self {
        Self::NotFound(placeholder.into())
    }

    /// True if no real data was extracted (empty or placeholder)
    pub fn is_blank(&self) -> bool {
        !matches!(self, Self::Found(_))
    }

    /// The text written to the output table
    pub fn as_str(&self) -> &str {
        match self {
            Self::Empty => "",
            Self::Found(value) | Self::NotFound(value) => value,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted product
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductRecord {
    pub name: FieldValue,

    /// First image URL if several were listed
    pub image: FieldValue,

    pub description: FieldValue,

    pub sku: FieldValue,

    /// Decimal-comma formatted price (`19,99`)
    pub price: FieldValue,

    /// Canonical product URL, falling back to the page it was found on
    pub url: String,
}

impl ProductRecord {
    /// True if every data field is empty or a placeholder
    ///
    /// The source URL alone does not make a record worth writing.
    pub fn is_empty(&self) -> bool {
        [
            &self.name,
            &self.image,
            &self.description,
            &self.sku,
            &self.price,
        ]
        .iter()
        .all(|field| field.is_blank())
    }

    /// The record as a table row, in [`PRODUCT_COLUMNS`] order
    pub fn to_row(&self) -> [&str; 6] {
        [
            self.name.as_str(),
            self.image.as_str(),
            self.description.as_str(),
            self.sku.as_str(),
            self.price.as_str(),
            &self.url,
        ]
    }
}

/// Replaces the decimal point with a comma (`19.99` → `19,99`)
pub fn decimal_comma(price: &str) -> String {
    price.replace('.', ",")
}

/// Summary statistics for a finished crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    pub seed_url: String,
    pub started_at: String,
    pub finished_at: String,
    pub duration_seconds: f64,

    /// True if the stop signal ended the run
    pub cancelled: bool,

    pub pages_visited: u64,
    pub pages_left_pending: u64,
    pub pages_fetched: u64,
    pub pages_failed: u64,
    pub products_written: u64,

    /// Pages matching the product identifier that yielded no record
    pub product_pages_without_record: u64,
}

impl CrawlSummary {
    /// Returns the share of dispatched pages that were fetched, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.pages_visited == 0 {
            return 0.0;
        }
        (self.pages_fetched as f64 / self.pages_visited as f64) * 100.0
    }

    /// Returns pages processed per second
    pub fn pages_per_second(&self) -> f64 {
        if self.duration_seconds <= 0.0 {
            return 0.0;
        }
        self.pages_visited as f64 / self.duration_seconds
    }
}

/// Trait for product sinks
///
/// A sink is owned by the coordinator and written from it alone, so rows
/// never interleave.
pub trait ProductSink {
    /// Appends one product row
    fn write(&mut self, record: &ProductRecord) -> OutputResult<()>;

    /// Pushes buffered rows to the underlying storage
    fn flush(&mut self) -> OutputResult<()> {
        Ok(())
    }
}

impl<S: ProductSink + ?Sized> ProductSink for &mut S {
    fn write(&mut self, record: &ProductRecord) -> OutputResult<()> {
        (**self).write(record)
    }

    fn flush(&mut self) -> OutputResult<()> {
        (**self).flush()
    }
}

/// In-memory sink, mostly useful for tests and embedding
impl ProductSink for Vec<ProductRecord> {
    fn write(&mut self, record: &ProductRecord) -> OutputResult<()> {
        self.push(record.clone());
        Ok(())
    }
}

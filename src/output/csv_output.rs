//! CSV product sink
//!
//! The file is truncated and the header written when the sink is created;
//! rows are appended for the rest of the run.

use crate::output::traits::{OutputResult, ProductRecord, ProductSink, PRODUCT_COLUMNS};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Writes one CSV row per product
pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows: u64,
}

impl CsvSink {
    /// Creates (or truncates) the CSV file and writes the header row
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the CSV file
    ///
    /// # Returns
    ///
    /// * `Ok(CsvSink)` - File created with the header in place
    /// * `Err(OutputError)` - The file could not be created or written
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(PRODUCT_COLUMNS)?;
        writer.flush()?;

        tracing::debug!("Created product file {}", path.display());

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of data rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

impl ProductSink for CsvSink {
    fn write(&mut self, record: &ProductRecord) -> OutputResult<()> {
        self.writer.write_record(record.to_row())?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

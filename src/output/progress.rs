//! Progress and log channel
//!
//! The crawler reports to its caller through a [`ProgressSink`]. Delivery is
//! best-effort: a sink whose consumer has gone away just drops events.

use crate::output::traits::CrawlSummary;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Counts reported after every processed page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub visited: usize,
    pub pending: usize,
    pub products: u64,
}

impl ProgressSnapshot {
    /// Human-readable status line, e.g. `Visited: 3 | Queuing: 7 | products: 1.`
    pub fn status_line(&self) -> String {
        format!(
            "Visited: {} | Queuing: {} | product{}: {}.",
            self.visited,
            self.pending,
            if self.products == 1 { "" } else { "s" },
            self.products
        )
    }
}

/// Event delivered to a [`ProgressSink`]
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    /// Operator-facing status, error or milestone line
    Log(String),

    /// Counts after a page was processed
    Progress(ProgressSnapshot),

    /// Final summary; always the last event of a run
    Finished(CrawlSummary),
}

/// Receiver of crawl events supplied by the caller
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: CrawlEvent);
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: CrawlEvent) {}
}

/// Sink backed by an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<CrawlEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiver its consumer polls
    pub fn new() -> (Self, UnboundedReceiver<CrawlEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: CrawlEvent) {
        // Receiver gone means nobody is listening; that's fine.
        let _ = self.tx.send(event);
    }
}

/// Logger handle threaded through every crawl component
///
/// Each line goes to `tracing` and to the caller's sink. Cloning is cheap; the
/// handle lives as long as one crawl run.
#[derive(Clone)]
pub struct CrawlLog {
    sink: Arc<dyn ProgressSink>,
}

impl CrawlLog {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self { sink }
    }

    /// A handle that only writes to `tracing`
    pub fn silent() -> Self {
        Self::new(Arc::new(NullSink))
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.sink.emit(CrawlEvent::Log(message));
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.sink.emit(CrawlEvent::Log(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}", message);
        self.sink.emit(CrawlEvent::Log(message));
    }

    /// Sends the status line and the raw counts
    pub fn progress(&self, snapshot: ProgressSnapshot) {
        let line = snapshot.status_line();
        tracing::debug!("{}", line);
        self.sink.emit(CrawlEvent::Log(line));
        self.sink.emit(CrawlEvent::Progress(snapshot));
    }

    pub fn finished(&self, summary: CrawlSummary) {
        self.sink.emit(CrawlEvent::Finished(summary));
    }
}

impl std::fmt::Debug for CrawlLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlLog").finish_non_exhaustive()
    }
}

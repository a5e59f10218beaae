//! Output module: the pipeline sink interface and crawl statistics
//!
//! Parsers produce `Record`s; the engine forwards each one to a
//! `PipelineSink`. This module ships three small sinks:
//! - `CollectingSink` keeps records in memory
//! - `ChannelSink` forwards records over a tokio channel
//! - `JsonLinesSink` writes newline-delimited JSON to any writer

pub mod stats;

pub use stats::{format_statistics, CrawlStatistics};

use async_trait::async_trait;
use std::io::Write;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// An extracted record: an arbitrary structured mapping
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Receives extracted records
///
/// The engine imposes no contract beyond delivery; sinks handle their own
/// failures.
#[async_trait]
pub trait PipelineSink: Send + Sync {
    async fn accept(&self, record: Record);
}

/// Sink that keeps every record in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<Record>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the records received so far
    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PipelineSink for CollectingSink {
    async fn accept(&self, record: Record) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }
}

/// Sink that forwards records to a channel receiver
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<Record>,
}

impl ChannelSink {
    /// Creates the sink and the receiving end of its channel
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Record>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl PipelineSink for ChannelSink {
    async fn accept(&self, record: Record) {
        if self.sender.send(record).await.is_err() {
            tracing::debug!("Record receiver dropped; discarding record");
        }
    }
}

/// Sink that writes each record as one line of JSON
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the sink and returns the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<W: Write + Send> PipelineSink for JsonLinesSink<W> {
    async fn accept(&self, record: Record) {
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let result = serde_json::to_writer(&mut *writer, &record)
            .map_err(std::io::Error::from)
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush());

        if let Err(e) = result {
            tracing::warn!("Failed to write record: {}", e);
        }
    }
}

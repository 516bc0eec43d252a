//! Bounded-queue collector turning fetched messages into reports
//!
//! A producer thread feeds raw messages into a bounded queue, a rayon pool
//! parses them and the calling thread hands accepted reports to the sink. A
//! full queue blocks the producer. Messages that are not reports, or that
//! fail to build, are logged and skipped.

use crate::error::{ParseError, Result};
use crate::parser::parse_report;
use crate::types::Report;
use rayon::iter::{ParallelBridge, ParallelIterator};
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, info, warn};

/// Messages allowed in flight between the producer and the workers
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;

/// Collector tuning
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CollectorConfig {
    /// Bounded queue size; zero is treated as one
    pub queue_capacity: usize,

    /// Threads in the parsing pool; zero is treated as one
    pub workers: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            workers: 1,
        }
    }
}

/// A fetched message and the identifier its source gave it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub id: String,
    pub bytes: Vec<u8>,
}

impl RawMessage {
    pub fn new(id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            bytes: bytes.into(),
        }
    }
}

/// Counters for one collector run
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectStats {
    pub received: usize,
    pub reported: usize,
    pub unknown: usize,
    pub failed: usize,
}

enum Outcome {
    Reported(Box<Report>),
    Unknown,
    Failed,
}

/// Drives messages through [`parse_report`] on a worker pool
#[derive(Debug, Clone, Default)]
pub struct Collector {
    config: CollectorConfig,
}

impl Collector {
    #[must_use]
    pub const fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Parse every message and pass accepted reports to `sink`
    ///
    /// Returns once the input is exhausted and the queue drained. With more
    /// than one worker, reports reach the sink in completion order.
    pub fn run<I, F>(&self, messages: I, mut sink: F) -> Result<CollectStats>
    where
        I: IntoIterator<Item = RawMessage>,
        I::IntoIter: Send,
        F: FnMut(Report),
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .thread_name(|index| format!("bounce-worker-{index}"))
            .build()
            .map_err(|e| ParseError::WorkerPool(e.to_string()))?;
        let (message_tx, message_rx) = mpsc::sync_channel(self.config.queue_capacity.max(1));
        let (outcome_tx, outcome_rx) = mpsc::channel();
        let messages = messages.into_iter();
        let mut stats = CollectStats::default();

        thread::scope(|scope| {
            scope.spawn(move || {
                for message in messages {
                    if message_tx.send(message).is_err() {
                        break;
                    }
                }
            });

            scope.spawn(move || {
                pool.install(|| {
                    message_rx
                        .into_iter()
                        .par_bridge()
                        .map(process)
                        .for_each_with(outcome_tx, |outcome_tx, outcome| {
                            // The receiver lives until every outcome is drained
                            let _ = outcome_tx.send(outcome);
                        });
                });
            });

            for outcome in outcome_rx {
                stats.received += 1;
                match outcome {
                    Outcome::Reported(report) => {
                        stats.reported += 1;
                        sink(*report);
                    }
                    Outcome::Unknown => stats.unknown += 1,
                    Outcome::Failed => stats.failed += 1,
                }
            }
        });

        info!(
            "Collected {} reports from {} messages ({} unknown, {} failed)",
            stats.reported, stats.received, stats.unknown, stats.failed
        );
        Ok(stats)
    }

    /// Run and gather the reports into a `Vec`
    pub fn collect<I>(&self, messages: I) -> Result<(Vec<Report>, CollectStats)>
    where
        I: IntoIterator<Item = RawMessage>,
        I::IntoIter: Send,
    {
        let mut reports = Vec::new();
        let stats = self.run(messages, |report| reports.push(report))?;
        Ok((reports, stats))
    }
}

fn process(message: RawMessage) -> Outcome {
    match parse_report(&message.bytes) {
        Ok(Some(report)) => Outcome::Reported(Box::new(report.with_id(message.id))),
        Ok(None) => {
            debug!("Skipping message {}: not a bounce report", message.id);
            Outcome::Unknown
        }
        Err(e) => {
            warn!("Skipping message {}: {e}", message.id);
            Outcome::Failed
        }
    }
}

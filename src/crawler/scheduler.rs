//! Batch scheduler
//!
//! This module handles:
//! - Splitting the remaining work queue into fixed-size batches
//! - Running every item of a batch concurrently and waiting for all of them
//! - Turning a panicking item into a `Failure` outcome
//! - Pausing between batches (never after the last one)
//!
//! The scheduler never touches storage. Outcomes are handed to a
//! [`BatchSink`] after each batch, which is where the driver checkpoints.

use crate::config::CrawlerConfig;
use crate::record::{FailureReason, Outcome, WorkItem};
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::time::Duration;

/// Position of a finished batch within the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based index of the batch that just finished
    pub batch: usize,
    /// Total number of batches in this run
    pub batches: usize,
    /// Items attempted so far, including this batch
    pub completed: usize,
    /// Items in the whole run
    pub total: usize,
}

/// Receives the outcomes of each finished batch
pub trait BatchSink {
    /// Called once per batch, after every item in it has an outcome
    fn on_batch(&mut self, progress: BatchProgress, outcomes: Vec<Outcome>) -> crate::Result<()>;
}

/// Runs work items in bounded, paced batches
#[derive(Debug, Clone)]
pub struct Scheduler {
    batch_size: usize,
    batch_delay: Duration,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// A `batch_size` of zero is treated as one.
    pub fn new(batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.batch_size, config.batch_delay())
    }

    /// Runs one batch: every item concurrently, one outcome per item
    ///
    /// Outcomes are returned in completion order. Each item runs as its own
    /// tokio task, so a panic inside `task` is contained and reported as an
    /// [`FailureReason::Unknown`] failure for that item's key.
    pub async fn run_batch<F, Fut>(&self, items: Vec<WorkItem>, task: F) -> Vec<Outcome>
    where
        F: Fn(WorkItem) -> Fut,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        let mut pending: FuturesUnordered<_> = items
            .into_iter()
            .map(|item| {
                let key = item.key.clone();
                let handle = tokio::spawn(task(item));
                async move { (key, handle.await) }
            })
            .collect();

        let mut outcomes = Vec::with_capacity(pending.len());

        while let Some((key, joined)) = pending.next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => {
                    tracing::error!("Task for {} panicked", key);
                    Outcome::failure(key, FailureReason::Unknown, "Task panicked")
                }
                Err(e) => Outcome::failure(key, FailureReason::Unknown, e.to_string()),
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Runs every item, batch by batch, reporting each batch to `sink`
    ///
    /// # Arguments
    ///
    /// * `items` - The full remaining work queue
    /// * `task` - Fetch-and-extract routine producing one outcome per item
    /// * `sink` - Receives each batch's outcomes before the next batch starts
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Every batch ran and was accepted by the sink
    /// * `Err(HarvestError)` - The sink rejected a batch; later batches are not run
    pub async fn run<F, Fut, S>(&self, items: Vec<WorkItem>, task: F, sink: &mut S) -> crate::Result<()>
    where
        F: Fn(WorkItem) -> Fut,
        Fut: Future<Output = Outcome> + Send + 'static,
        S: BatchSink + ?Sized,
    {
        let total = items.len();
        let batches = (total + self.batch_size - 1) / self.batch_size;
        let mut completed = 0;
        let mut queue = items.into_iter().peekable();
        let mut batch = 0;

        while queue.peek().is_some() {
            batch += 1;
            let chunk: Vec<WorkItem> = queue.by_ref().take(self.batch_size).collect();
            completed += chunk.len();

            tracing::debug!("Starting batch {}/{} ({} items)", batch, batches, chunk.len());
            let outcomes = self.run_batch(chunk, &task).await;

            sink.on_batch(
                BatchProgress {
                    batch,
                    batches,
                    completed,
                    total,
                },
                outcomes,
            )?;

            if queue.peek().is_some() && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        Ok(())
    }
}

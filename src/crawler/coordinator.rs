//! Pipeline coordinator - main harvest orchestration logic
//!
//! This module drives the two phases of a harvest:
//! - Discovery: paging through listing pages and growing the known-URL set,
//!   saving after every page
//! - Detail extraction: running every not-yet-successful URL through the
//!   batch scheduler, checkpointing after every batch
//!
//! The coordinator is the only owner of the listing store and the checkpoint
//! store. Fetching and extraction happen in scheduler tasks that return
//! outcomes and never write to storage.

use crate::config::Config;
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::scheduler::{BatchProgress, BatchSink, Scheduler};
use crate::extract::{DaadExtractor, PageExtractor};
use crate::record::{FailureReason, Outcome, ScrapedRecord, WorkItem};
use crate::state::PipelinePhase;
use crate::storage::{open_checkpoint, open_listings, CheckpointStore, ListingStore};
use crate::url::listing_page_url;
use crate::{HarvestError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Counts from one discovery pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Listing pages fetched and extracted
    pub pages_ok: u32,
    /// Listing pages skipped after a fetch or extract error
    pub pages_failed: u32,
    /// Records not previously known
    pub new_listings: usize,
    /// Size of the known-URL set afterwards
    pub total_listings: usize,
}

/// Counts from one detail-extraction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Work items attempted in this pass
    pub attempted: usize,
    /// Successes in this pass
    pub succeeded: usize,
    /// Failures in this pass
    pub failed: usize,
    /// Size of the success collection afterwards
    pub total_successes: usize,
    /// Size of the failure collection afterwards
    pub total_failures: usize,
}

/// Main pipeline coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn PageExtractor>,
    scheduler: Scheduler,
    listings: ListingStore,
    checkpoint: Box<dyn CheckpointStore>,
    phase: PipelinePhase,
}

impl Coordinator {
    /// Creates a coordinator with the HTTP fetcher, DAAD extractor and JSON
    /// stores described by `config`
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run; nothing has been read from disk yet
    /// * `Err(HarvestError)` - The HTTP client or base origin is unusable
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::from_config(&config.user_agent, &config.crawler)?;
        let extractor = DaadExtractor::new(&config.source.base_origin)?;
        let checkpoint = open_checkpoint(&config);

        Ok(Self::with_components(
            config,
            Arc::new(fetcher),
            Arc::new(extractor),
            Box::new(checkpoint),
        ))
    }

    /// Creates a coordinator from explicit collaborators
    pub fn with_components(
        config: Config,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn PageExtractor>,
        checkpoint: Box<dyn CheckpointStore>,
    ) -> Self {
        Self {
            scheduler: Scheduler::from_config(&config.crawler),
            listings: open_listings(&config),
            config: Arc::new(config),
            fetcher,
            extractor,
            checkpoint,
            phase: PipelinePhase::Idle,
        }
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    fn transition(&mut self, to: PipelinePhase) -> Result<()> {
        if !self.phase.can_transition_to(to) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        tracing::debug!("Phase {} -> {}", self.phase, to);
        self.phase = to;
        Ok(())
    }

    /// Marks the current pass as finished
    ///
    /// Used after a discovery-only pass; extraction passes finish themselves.
    pub fn finish(&mut self) -> Result<()> {
        self.transition(PipelinePhase::Done)
    }

    /// Pages through the listing and merges new records into the known-URL set
    ///
    /// With `last-page` configured, pages `1..=last_page` are visited and
    /// failed pages are skipped. Without it, discovery stops at the first page
    /// that yields no records, or after `discovery-failure-limit` consecutive
    /// failed pages. The listing file is saved after every page with records.
    pub async fn discover_listings(&mut self) -> Result<DiscoveryReport> {
        self.transition(PipelinePhase::DiscoveringListings)?;

        let known = self.listings.load()?;
        tracing::info!("Discovery resuming with {} known listings", known);

        let source = &self.config.source;
        let failure_limit = self.config.crawler.discovery_failure_limit.max(1);
        let mut report = DiscoveryReport::default();
        let mut consecutive_failures = 0;
        let mut page: u32 = 1;

        loop {
            if let Some(last) = source.last_page {
                if page > last {
                    break;
                }
            }

            let url = listing_page_url(&source.listing_url, &source.page_param, page)?;
            match source.last_page {
                Some(last) => tracing::info!("Fetching listing page {}/{}", page, last),
                None => tracing::info!("Fetching listing page {}", page),
            }

            let records = match self.fetcher.fetch(url.as_str()).await {
                Ok(body) => self.extractor.extract_listing(&body).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match records {
                Err(e) => {
                    tracing::warn!("Skipping listing page {}: {}", page, e);
                    report.pages_failed += 1;
                    consecutive_failures += 1;

                    if source.last_page.is_none() && consecutive_failures >= failure_limit {
                        tracing::warn!(
                            "Stopping discovery after {} consecutive failed pages",
                            consecutive_failures
                        );
                        break;
                    }
                }
                Ok(records) if records.is_empty() && source.last_page.is_none() => {
                    tracing::info!("Listing page {} is empty, discovery complete", page);
                    report.pages_ok += 1;
                    break;
                }
                Ok(records) => {
                    consecutive_failures = 0;
                    report.pages_ok += 1;

                    let found = records.len();
                    let added = self.listings.merge(records);
                    report.new_listings += added;

                    if let Err(e) = self.listings.save() {
                        tracing::error!("Failed to save listings after page {}: {}", page, e);
                    }

                    tracing::info!(
                        "Page {}: found {} links, added {} new, total {}",
                        page,
                        found,
                        added,
                        self.listings.len()
                    );
                }
            }

            page += 1;
        }

        // A final save covers a page whose own save failed.
        self.listings.save()?;

        report.total_listings = self.listings.len();
        tracing::info!(
            "Discovery finished: {} pages ok, {} failed, {} new listings, {} total",
            report.pages_ok,
            report.pages_failed,
            report.new_listings,
            report.total_listings
        );

        Ok(report)
    }

    /// Fetches and extracts every known URL that has not succeeded yet
    ///
    /// Prior failures are included: a failed key is simply "not yet
    /// successful". Ends in [`PipelinePhase::Done`], also when the pass fails.
    pub async fn extract_details(&mut self) -> Result<ExtractionReport> {
        self.transition(PipelinePhase::ExtractingDetails)?;

        if self.listings.is_empty() {
            self.listings.load()?;
        }
        if self.listings.is_empty() {
            tracing::warn!(
                "No listings found in {}; run discovery first",
                self.config.output.listings_path
            );
        }

        let succeeded = self.checkpoint.load()?;
        tracing::info!(
            "Resuming: {} already processed, {} failed",
            self.checkpoint.success_count(),
            self.checkpoint.failure_count()
        );

        let remaining = remaining_items(self.listings.work_items(), &succeeded);
        tracing::info!("Remaining to process: {}", remaining.len());

        let result = self.run_items(remaining).await;
        self.transition(PipelinePhase::Done)?;
        result
    }

    /// Re-queues every key in the failure collection as a new work item
    ///
    /// Unlike [`extract_details`](Self::extract_details), never-attempted
    /// listings are left alone.
    pub async fn retry_failures(&mut self) -> Result<ExtractionReport> {
        self.transition(PipelinePhase::ExtractingDetails)?;

        let succeeded = self.checkpoint.load()?;
        let retry: Vec<WorkItem> = self
            .checkpoint
            .failure_keys()
            .into_iter()
            .map(WorkItem::from_key)
            .collect();
        let retry = remaining_items(retry, &succeeded);
        tracing::info!("Retrying {} failed URLs", retry.len());

        let result = self.run_items(retry).await;
        self.transition(PipelinePhase::Done)?;
        result
    }

    /// Runs discovery followed by detail extraction
    pub async fn run(&mut self) -> Result<ExtractionReport> {
        let start = Instant::now();

        self.discover_listings().await?;
        let report = self.extract_details().await?;

        tracing::info!(
            "Harvest complete in {:.1}s: {} successful, {} failed",
            start.elapsed().as_secs_f64(),
            report.total_successes,
            report.total_failures
        );
        Ok(report)
    }

    async fn run_items(&mut self, items: Vec<WorkItem>) -> Result<ExtractionReport> {
        let fetcher = Arc::clone(&self.fetcher);
        let extractor = Arc::clone(&self.extractor);
        let task = move |item: WorkItem| {
            let fetcher = Arc::clone(&fetcher);
            let extractor = Arc::clone(&extractor);
            async move { process_item(fetcher.as_ref(), extractor.as_ref(), item).await }
        };

        let mut sink = CheckpointSink {
            store: self.checkpoint.as_mut(),
            succeeded: 0,
            failed: 0,
        };
        let attempted = items.len();

        self.scheduler.run(items, task, &mut sink).await?;
        let (succeeded, failed) = (sink.succeeded, sink.failed);

        // Per-batch flush errors are tolerated; this one is not.
        self.checkpoint.flush()?;

        let report = ExtractionReport {
            attempted,
            succeeded,
            failed,
            total_successes: self.checkpoint.success_count(),
            total_failures: self.checkpoint.failure_count(),
        };
        tracing::info!(
            "Pass finished: {} attempted, {} succeeded, {} failed ({} successful / {} failed overall)",
            report.attempted,
            report.succeeded,
            report.failed,
            report.total_successes,
            report.total_failures
        );
        Ok(report)
    }
}

/// Drops items that already succeeded and duplicate keys, keeping order
fn remaining_items(items: Vec<WorkItem>, succeeded: &HashSet<String>) -> Vec<WorkItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| !succeeded.contains(&item.key) && seen.insert(item.key.clone()))
        .collect()
}

/// Fetches and extracts one work item into its outcome
async fn process_item(
    fetcher: &dyn PageFetcher,
    extractor: &dyn PageExtractor,
    item: WorkItem,
) -> Outcome {
    tracing::debug!("Fetching {}", item.key);

    let body = match fetcher.fetch(&item.key).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("Failed {}: {}", item.key, e);
            return Outcome::failure(item.key, e.reason(), e.to_string());
        }
    };

    match extractor.extract_detail(&body, &item.key) {
        Ok(mut detail) => {
            // The record is stored under the key it was fetched for.
            if detail.link.as_deref() != Some(item.key.as_str()) {
                tracing::debug!("Extractor returned link {:?} for {}", detail.link, item.key);
                detail.link = Some(item.key);
            }
            Outcome::Success(Box::new(ScrapedRecord::now(detail)))
        }
        Err(e) => {
            tracing::warn!("Failed to extract {}: {}", item.key, e);
            Outcome::failure(item.key, FailureReason::Extract, e.to_string())
        }
    }
}

/// Records each batch into the checkpoint store and flushes it
struct CheckpointSink<'a> {
    store: &'a mut dyn CheckpointStore,
    succeeded: usize,
    failed: usize,
}

impl BatchSink for CheckpointSink<'_> {
    fn on_batch(&mut self, progress: BatchProgress, outcomes: Vec<Outcome>) -> Result<()> {
        let (mut ok, mut failed) = (0, 0);

        for outcome in outcomes {
            match outcome {
                Outcome::Success(record) => {
                    ok += 1;
                    self.store.record_success(*record);
                }
                Outcome::Failure {
                    key,
                    reason,
                    detail,
                } => {
                    failed += 1;
                    self.store.record_failure(&key, reason, &detail);
                }
            }
        }

        self.succeeded += ok;
        self.failed += failed;

        // Every flush rewrites both files in full.
        if let Err(e) = self.store.flush() {
            tracing::error!("Checkpoint flush after batch {} failed: {}", progress.batch, e);
        }

        tracing::info!(
            "Batch {}/{}: {} successful, {} failed ({}/{} items, {} successful / {} failed overall)",
            progress.batch,
            progress.batches,
            ok,
            failed,
            progress.completed,
            progress.total,
            self.store.success_count(),
            self.store.failure_count()
        );

        Ok(())
    }
}

/// Runs a complete harvest: discovery, then detail extraction
///
/// Safe to call repeatedly: already-known listings are kept, and keys that
/// already succeeded are never fetched again.
///
/// # Returns
///
/// * `Ok((successes, failures))` - Sizes of the success and failure collections
/// * `Err(HarvestError)` - Setup failed or the final checkpoint could not be written
pub async fn run_pipeline(config: Config) -> Result<(usize, usize)> {
    let mut coordinator = Coordinator::new(config)?;
    let report = coordinator.run().await?;
    Ok((report.total_successes, report.total_failures))
}

//! Crawler module for fetching pages and driving the harvest
//!
//! This module contains the core pipeline logic, including:
//! - HTTP fetching with failure classification
//! - Batch scheduling with an inter-batch delay
//! - Overall pipeline coordination and checkpointing

mod coordinator;
mod fetcher;
mod scheduler;

pub use coordinator::{run_pipeline, Coordinator, DiscoveryReport, ExtractionReport};
pub use fetcher::{build_http_client, FetchError, HttpFetcher, PageFetcher};
pub use scheduler::{BatchProgress, BatchSink, Scheduler};

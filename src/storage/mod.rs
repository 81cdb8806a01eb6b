//! Storage module for persisting harvest progress
//!
//! This module handles every durable file the pipeline writes:
//! - The discovered listing collection (known-URL set)
//! - The success and failure collections used as the checkpoint
//! - Atomic whole-file rewrites shared by all of them

mod json;
mod listing;
mod traits;

pub(crate) use json::index_key;
pub use json::{read_json_array, write_json_atomic, JsonCheckpointStore};
pub use listing::ListingStore;
pub use traits::{CheckpointStore, StorageError, StorageResult};

use crate::config::Config;

/// Opens the checkpoint store described by the output configuration
///
/// Nothing is read until [`CheckpointStore::load`] is called.
pub fn open_checkpoint(config: &Config) -> JsonCheckpointStore {
    JsonCheckpointStore::new(&config.output.programmes_path, &config.output.failures_path)
}

/// Opens the listing store described by the output configuration
pub fn open_listings(config: &Config) -> ListingStore {
    ListingStore::new(&config.output.listings_path)
}

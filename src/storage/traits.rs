//! Storage traits and error types
//!
//! This module defines the checkpoint-store interface used by the pipeline
//! driver and the errors shared by every file-backed store.

use crate::record::{FailureReason, ScrapedRecord};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable record of which work items have succeeded or failed
///
/// The store is owned by a single writer (the pipeline driver) and mutated
/// only between batches. `record_*` calls change the in-memory state; nothing
/// reaches disk until [`flush`](CheckpointStore::flush), which rewrites both
/// collections.
///
/// Invariant: a key is in at most one of the two collections.
pub trait CheckpointStore: Send {
    /// Loads both collections and returns the set of succeeded keys
    ///
    /// A missing or empty backing file counts as an empty collection.
    /// Calling `load` again discards unflushed in-memory changes.
    fn load(&mut self) -> StorageResult<HashSet<String>>;

    /// Records a success, removing any earlier failure for the same key
    fn record_success(&mut self, record: ScrapedRecord);

    /// Records a failure, replacing any earlier failure for the same key
    fn record_failure(&mut self, key: &str, reason: FailureReason, detail: &str);

    /// Atomically rewrites both collections
    fn flush(&mut self) -> StorageResult<()>;

    /// Keys currently in the failure collection, in file order
    fn failure_keys(&self) -> Vec<String>;

    /// Number of records in the success collection
    fn success_count(&self) -> usize;

    /// Number of records in the failure collection
    fn failure_count(&self) -> usize;
}

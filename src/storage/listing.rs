//! Discovery output: the known-URL set
//!
//! Holds every listing record found so far, deduplicated by canonical URL.
//! The driver saves after every listing page.

use crate::record::{ListingRecord, WorkItem};
use crate::storage::json::{index_key, read_json_array, write_json_atomic};
use crate::storage::traits::StorageResult;
use std::collections::HashSet;
use std::path::PathBuf;

/// File-backed, deduplicated list of discovered programmes
#[derive(Debug)]
pub struct ListingStore {
    path: PathBuf,
    records: Vec<ListingRecord>,
    seen: HashSet<String>,
}

impl ListingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Loads the file, dropping duplicate URLs; returns the record count
    pub fn load(&mut self) -> StorageResult<usize> {
        let stored: Vec<ListingRecord> = read_json_array(&self.path)?;

        self.records.clear();
        self.seen.clear();
        self.merge(stored);

        Ok(self.records.len())
    }

    /// Adds records whose URL is not yet known; returns how many were new
    pub fn merge(&mut self, records: impl IntoIterator<Item = ListingRecord>) -> usize {
        let before = self.records.len();

        for record in records {
            if self.seen.insert(index_key(&record.url)) {
                self.records.push(record);
            }
        }

        self.records.len() - before
    }

    /// Atomically rewrites the file
    pub fn save(&self) -> StorageResult<()> {
        write_json_atomic(&self.path, &self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Work items for every known record, in discovery order
    ///
    /// Records whose URL is not a valid http(s) URL are skipped with a warning.
    pub fn work_items(&self) -> Vec<WorkItem> {
        self.records
            .iter()
            .filter_map(|record| match WorkItem::from_listing(record.clone()) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!("Skipping listing '{}' ({}): {}", record.name, record.url, e);
                    None
                }
            })
            .collect()
    }
}

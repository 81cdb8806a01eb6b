//! JSON-file storage
//!
//! Collections are pretty-printed JSON arrays. Every write goes to
//! `<file>.tmp` first and is then renamed over the target, so a process killed
//! mid-write leaves the previous version intact.

use crate::record::{FailureReason, FailureRecord, ScrapedRecord};
use crate::storage::traits::{CheckpointStore, StorageError, StorageResult};
use crate::url::canonical_key;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Reads a JSON array from `path`
///
/// A missing file, or one that holds only whitespace, yields an empty vector.
pub fn read_json_array<T: DeserializeOwned>(path: &Path) -> StorageResult<Vec<T>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&content).map_err(|source| StorageError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Writes `items` to `path` as a pretty-printed JSON array, atomically
pub fn write_json_atomic<T: Serialize>(path: &Path, items: &[T]) -> StorageResult<()> {
    let io_err = |source: std::io::Error| StorageError::Io {
        path: path.display().to_string(),
        source,
    };

    let body = serde_json::to_vec_pretty(items).map_err(|source| StorageError::Json {
        path: path.display().to_string(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp = tmp_path(path);
    std::fs::write(&tmp, body).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Index key for a stored URL: canonical when possible, verbatim otherwise
pub(crate) fn index_key(url: &str) -> String {
    canonical_key(url).unwrap_or_else(|_| url.to_string())
}

/// Checkpoint store backed by a success file and a failure file
#[derive(Debug)]
pub struct JsonCheckpointStore {
    successes_path: PathBuf,
    failures_path: PathBuf,
    successes: Vec<ScrapedRecord>,
    success_index: HashMap<String, usize>,
    failures: Vec<FailureRecord>,
}

impl JsonCheckpointStore {
    /// Creates a store over the two files; nothing is read until `load`
    pub fn new(successes_path: impl Into<PathBuf>, failures_path: impl Into<PathBuf>) -> Self {
        Self {
            successes_path: successes_path.into(),
            failures_path: failures_path.into(),
            successes: Vec::new(),
            success_index: HashMap::new(),
            failures: Vec::new(),
        }
    }

    fn insert_success(&mut self, record: ScrapedRecord) {
        let Some(key) = record.key().map(index_key) else {
            // Unkeyed rows from older files are kept but never deduplicated.
            self.successes.push(record);
            return;
        };

        match self.success_index.get(&key) {
            Some(&pos) => self.successes[pos] = record,
            None => {
                self.success_index.insert(key, self.successes.len());
                self.successes.push(record);
            }
        }
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&mut self) -> StorageResult<HashSet<String>> {
        let successes: Vec<ScrapedRecord> = read_json_array(&self.successes_path)?;
        let failures: Vec<FailureRecord> = read_json_array(&self.failures_path)?;

        self.successes.clear();
        self.success_index.clear();
        for record in successes {
            self.insert_success(record);
        }

        // A key that succeeded is not a failure, whatever the files say; of
        // repeated failures the last one is kept.
        let mut seen = HashSet::new();
        let mut kept: Vec<FailureRecord> = failures
            .into_iter()
            .rev()
            .filter(|f| {
                let key = index_key(&f.url);
                !self.success_index.contains_key(&key) && seen.insert(key)
            })
            .collect();
        kept.reverse();
        self.failures = kept;

        tracing::debug!(
            "Loaded checkpoint: {} successes, {} failures",
            self.successes.len(),
            self.failures.len()
        );

        Ok(self.success_index.keys().cloned().collect())
    }

    fn record_success(&mut self, record: ScrapedRecord) {
        if let Some(key) = record.key().map(index_key) {
            self.failures.retain(|f| index_key(&f.url) != key);
        }
        self.insert_success(record);
    }

    fn record_failure(&mut self, key: &str, reason: FailureReason, detail: &str) {
        let key = index_key(key);
        if self.success_index.contains_key(&key) {
            tracing::debug!("Ignoring failure for already succeeded {}", key);
            return;
        }

        self.failures.retain(|f| index_key(&f.url) != key);
        self.failures.push(FailureRecord::new(key, reason, detail));
    }

    fn flush(&mut self) -> StorageResult<()> {
        write_json_atomic(&self.successes_path, &self.successes)?;
        write_json_atomic(&self.failures_path, &self.failures)?;
        Ok(())
    }

    fn failure_keys(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.url.clone()).collect()
    }

    fn success_count(&self) -> usize {
        self.successes.len()
    }

    fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

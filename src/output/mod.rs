//! Output module for harvest summaries and exports
//!
//! This module handles:
//! - Computing and printing statistics over the harvest files
//! - Generating the markdown harvest summary
//! - Exporting the collections to SQLite

mod markdown;
mod sqlite_export;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary, SummaryContext};
pub use sqlite_export::{export_sqlite, ExportCounts};
pub use stats::{compute_statistics, load_statistics, print_statistics, HarvestStatistics};

use crate::config::Config;
use crate::record::{FailureRecord, ScrapedRecord};
use crate::storage::{read_json_array, StorageError};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes the markdown summary to the configured `summary-path`
///
/// # Arguments
///
/// * `config` - Supplies every input path and the summary path
/// * `config_hash` - Hash of the configuration file, if one was loaded
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - The statistics the summary was built from
/// * `Err(OutputError)` - Reading the collections or writing the file failed
pub fn write_summary(config: &Config, config_hash: Option<&str>) -> OutputResult<HarvestStatistics> {
    let stats = load_statistics(config)?;
    let context = SummaryContext {
        generated_at: chrono::Utc::now().to_rfc3339(),
        config_hash: config_hash.map(str::to_string),
    };

    let path = Path::new(&config.output.summary_path);
    generate_markdown_summary(&stats, &context, path)?;
    tracing::info!("Summary written to {}", path.display());

    Ok(stats)
}

/// Exports the configured collections to the configured `database-path`
pub fn export_collections(config: &Config) -> OutputResult<ExportCounts> {
    let successes: Vec<ScrapedRecord> = read_json_array(Path::new(&config.output.programmes_path))?;
    let failures: Vec<FailureRecord> = read_json_array(Path::new(&config.output.failures_path))?;

    let path = Path::new(&config.output.database_path);
    let counts = export_sqlite(path, &successes, &failures)?;
    tracing::info!(
        "Exported {} programmes and {} failures to {}",
        counts.programmes,
        counts.failures,
        path.display()
    );

    Ok(counts)
}

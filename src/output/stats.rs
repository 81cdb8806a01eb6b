//! Statistics generation from the harvest files
//!
//! This module provides functionality for computing and displaying harvest
//! statistics from the listing, success and failure collections.

use crate::config::Config;
use crate::output::OutputResult;
use crate::record::{FailureRecord, ListingRecord, ScrapedRecord};
use crate::storage::{index_key, read_json_array};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// How many degree types are listed individually
const TOP_DEGREES: usize = 10;

/// Harvest statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestStatistics {
    /// Records in the listing collection
    pub listings: usize,

    /// Records in the success collection
    pub successes: usize,

    /// Records in the failure collection
    pub failures: usize,

    /// Listings with neither a success nor a failure entry
    pub never_attempted: usize,

    /// Failures grouped by error string, most frequent first
    pub failures_by_error: Vec<(String, usize)>,

    /// Successes grouped by degree, most frequent first
    pub programmes_by_degree: Vec<(String, usize)>,

    /// Successes with at least one application deadline entry
    pub with_application_deadlines: usize,

    /// Successes with at least one contact block
    pub with_contacts: usize,

    /// Latest `scraped_at` value in the success collection
    pub last_scraped_at: Option<String>,
}

impl HarvestStatistics {
    /// Successes as a percentage of attempted keys
    pub fn success_rate(&self) -> f64 {
        let attempted = self.successes + self.failures;
        if attempted == 0 {
            0.0
        } else {
            (self.successes as f64 / attempted as f64) * 100.0
        }
    }

    /// Listings not yet successful (never attempted or failed)
    pub fn remaining(&self) -> usize {
        self.never_attempted + self.failures
    }
}

/// Loads statistics from the files named in `config`
///
/// # Arguments
///
/// * `config` - Supplies the listing, success and failure paths
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Missing files count as empty collections
/// * `Err(OutputError)` - A file exists but could not be read or parsed
pub fn load_statistics(config: &Config) -> OutputResult<HarvestStatistics> {
    let listings: Vec<ListingRecord> = read_json_array(Path::new(&config.output.listings_path))?;
    let successes: Vec<ScrapedRecord> = read_json_array(Path::new(&config.output.programmes_path))?;
    let failures: Vec<FailureRecord> = read_json_array(Path::new(&config.output.failures_path))?;

    Ok(compute_statistics(&listings, &successes, &failures))
}

/// Computes statistics from in-memory collections
pub fn compute_statistics(
    listings: &[ListingRecord],
    successes: &[ScrapedRecord],
    failures: &[FailureRecord],
) -> HarvestStatistics {
    let attempted: HashSet<String> = successes
        .iter()
        .filter_map(|r| r.key())
        .chain(failures.iter().map(|f| f.url.as_str()))
        .map(index_key)
        .collect();

    let known: HashSet<String> = listings.iter().map(|l| index_key(&l.url)).collect();
    let never_attempted = known.difference(&attempted).count();

    let mut by_error: HashMap<&str, usize> = HashMap::new();
    for failure in failures {
        *by_error.entry(failure.error.as_str()).or_default() += 1;
    }

    let mut by_degree: HashMap<&str, usize> = HashMap::new();
    for record in successes {
        let degree = record.detail.degree.as_deref().unwrap_or("(unknown)");
        *by_degree.entry(degree).or_default() += 1;
    }
    let mut programmes_by_degree = sorted_counts(by_degree);
    programmes_by_degree.truncate(TOP_DEGREES);

    HarvestStatistics {
        listings: listings.len(),
        successes: successes.len(),
        failures: failures.len(),
        never_attempted,
        failures_by_error: sorted_counts(by_error),
        programmes_by_degree,
        with_application_deadlines: successes
            .iter()
            .filter(|r| !r.detail.application_deadlines.is_empty())
            .count(),
        with_contacts: successes
            .iter()
            .filter(|r| !r.detail.contacts.is_empty())
            .count(),
        last_scraped_at: successes
            .iter()
            .map(|r| r.scraped_at.as_str())
            .filter(|s| !s.is_empty())
            .max()
            .map(str::to_string),
    }
}

fn sorted_counts(counts: HashMap<&str, usize>) -> Vec<(String, usize)> {
    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Listings discovered: {}", stats.listings);
    println!("  Programmes extracted: {}", stats.successes);
    println!("  Failed URLs: {}", stats.failures);
    println!("  Never attempted: {}", stats.never_attempted);
    println!("  Remaining (failed + never attempted): {}", stats.remaining());
    println!("  Success rate: {:.1}%", stats.success_rate());
    if let Some(last) = &stats.last_scraped_at {
        println!("  Last scraped at: {}", last);
    }
    println!();

    if !stats.failures_by_error.is_empty() {
        println!("Failures by Error:");
        for (error, count) in &stats.failures_by_error {
            println!("  {}: {}", error, count);
        }
        println!();
    }

    if !stats.programmes_by_degree.is_empty() {
        println!("Programmes by Degree (top {}):", TOP_DEGREES);
        for (degree, count) in &stats.programmes_by_degree {
            println!("  {}: {}", degree, count);
        }
        println!();
    }

    println!("Field Coverage:");
    println!(
        "  With application deadlines: {}",
        stats.with_application_deadlines
    );
    println!("  With contacts: {}", stats.with_contacts);
}

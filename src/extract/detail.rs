//! Detail-page assembly
//!
//! Runs every section extractor over the parsed page and merges the partial
//! records in a fixed order.

use crate::extract::sections::SECTIONS;
use crate::record::DetailRecord;
use scraper::Html;
use url::Url;

/// Extracts a full detail record from a parsed programme page
///
/// # Arguments
///
/// * `document` - The parsed detail page
/// * `base` - Origin used to resolve relative links
/// * `source_url` - The work-item key the page was fetched for
///
/// # Returns
///
/// A record whose `link` is `source_url`. Sections absent from the page leave
/// their fields unset.
pub fn extract_detail_record(document: &Html, base: &Url, source_url: &str) -> DetailRecord {
    let mut record = DetailRecord::for_link(source_url);

    for (name, extractor) in SECTIONS {
        let partial = extractor(document, base);
        if partial.is_blank() {
            tracing::trace!("Section '{}' empty on {}", name, source_url);
        }
        record.absorb(partial);
    }

    record
}

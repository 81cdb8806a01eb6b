//! Page extraction
//!
//! This module turns raw HTML into records:
//! - Listing pages into [`ListingRecord`]s (name + absolute URL)
//! - Detail pages into [`DetailRecord`]s, one independent sub-extractor per
//!   page section
//!
//! Extraction is pure and synchronous. It fails only when the input is not
//! HTML at all; missing sections or elements simply leave fields unset.

mod detail;
mod dom;
mod listing;
mod sections;

pub use detail::extract_detail_record;
pub use listing::extract_listing_records;

use crate::record::{DetailRecord, ListingRecord};
use crate::url::parse_origin;
use crate::UrlResult;
use scraper::Html;
use thiserror::Error;
use url::Url;

/// Errors that can occur while extracting a page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Input is not HTML: {0}")]
    NotHtml(String),
}

/// The page-extraction capability consumed by the pipeline
///
/// Implementations must be pure: no I/O and no shared mutable state, so one
/// instance can serve every task in a batch.
pub trait PageExtractor: Send + Sync {
    /// Extracts every programme card from a listing page
    fn extract_listing(&self, html: &[u8]) -> Result<Vec<ListingRecord>, ExtractError>;

    /// Extracts a detail page fetched from `source_url`
    ///
    /// The pipeline overwrites `link` of the result with `source_url`.
    fn extract_detail(&self, html: &[u8], source_url: &str) -> Result<DetailRecord, ExtractError>;
}

/// Extractor for the DAAD degree-programme pages
#[derive(Debug, Clone)]
pub struct DaadExtractor {
    base: Url,
}

impl DaadExtractor {
    /// Creates an extractor that resolves relative links against `base_origin`
    pub fn new(base_origin: &str) -> UrlResult<Self> {
        Ok(Self {
            base: parse_origin(base_origin)?,
        })
    }
}

impl PageExtractor for DaadExtractor {
    fn extract_listing(&self, html: &[u8]) -> Result<Vec<ListingRecord>, ExtractError> {
        let document = parse_document(html)?;
        Ok(extract_listing_records(&document, &self.base))
    }

    fn extract_detail(&self, html: &[u8], source_url: &str) -> Result<DetailRecord, ExtractError> {
        let document = parse_document(html)?;
        Ok(extract_detail_record(&document, &self.base, source_url))
    }
}

/// Decodes and parses a response body
///
/// The HTML parser accepts any string, so "not HTML" is decided up front: a
/// body that is blank or contains no markup at all is rejected.
fn parse_document(html: &[u8]) -> Result<Html, ExtractError> {
    let text = String::from_utf8_lossy(html);
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(ExtractError::NotHtml("empty body".to_string()));
    }
    if !trimmed.contains('<') {
        return Err(ExtractError::NotHtml("no markup found".to_string()));
    }

    Ok(Html::parse_document(trimmed))
}

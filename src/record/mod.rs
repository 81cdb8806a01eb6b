//! Data model for the harvest pipeline
//!
//! Listing pages produce [`ListingRecord`]s, which become [`WorkItem`]s for the
//! detail phase. Every attempted work item ends in exactly one [`Outcome`].

mod detail;

pub use detail::{ApplicationDeadline, ContactDetails, DeadlineLink, DetailRecord};

use crate::url::canonical_key;
use crate::UrlResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A programme card found on a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub name: String,
    pub url: String,
}

/// A unit of detail-phase work, identified by its canonical URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Canonical URL; also the key of the resulting record
    pub key: String,

    /// Discovery metadata, absent for items re-queued from the failure file
    pub payload: Option<ListingRecord>,
}

impl WorkItem {
    /// Builds a work item from a listing record, canonicalising its URL
    pub fn from_listing(listing: ListingRecord) -> UrlResult<Self> {
        let key = canonical_key(&listing.url)?;
        Ok(Self {
            key,
            payload: Some(listing),
        })
    }

    /// Builds a work item for a key with no discovery metadata
    pub fn from_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            payload: None,
        }
    }
}

/// A successfully extracted programme as written to the success file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedRecord {
    #[serde(flatten)]
    pub detail: DetailRecord,

    /// ISO-8601 time the page was extracted
    #[serde(default)]
    pub scraped_at: String,
}

impl ScrapedRecord {
    /// Stamps a freshly extracted record with the current time
    pub fn now(detail: DetailRecord) -> Self {
        Self {
            detail,
            scraped_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.detail.link.as_deref()
    }
}

/// Why a work item did not produce a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// Non-2xx response
    HttpStatus(u16),
    /// Request timed out
    Timeout,
    /// DNS or connection-level failure
    Network,
    /// Body could not be treated as HTML
    Extract,
    /// Anything else, including a panicking task
    Unknown,
}

/// Result of processing one work item
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Box<ScrapedRecord>),
    Failure {
        key: String,
        reason: FailureReason,
        detail: String,
    },
}

impl Outcome {
    pub fn failure(key: impl Into<String>, reason: FailureReason, detail: impl Into<String>) -> Self {
        Self::Failure {
            key: key.into(),
            reason,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The work-item key this outcome belongs to
    pub fn key(&self) -> &str {
        match self {
            Self::Success(record) => record.key().unwrap_or_default(),
            Self::Failure { key, .. } => key,
        }
    }
}

/// A failed key as written to the failure file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub url: String,
    /// `"HTTP <code>"`, `"Timeout"`, or a free-text message
    pub error: String,
}

impl FailureRecord {
    pub fn new(url: impl Into<String>, reason: FailureReason, detail: &str) -> Self {
        let error = match reason {
            FailureReason::HttpStatus(code) => format!("HTTP {}", code),
            FailureReason::Timeout => "Timeout".to_string(),
            _ => detail.to_string(),
        };

        Self {
            url: url.into(),
            error,
        }
    }
}

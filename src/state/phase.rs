/// Pipeline phase definitions for the harvest driver
///
/// The driver moves `Idle → DiscoveringListings → ExtractingDetails → Done`.
/// `ExtractingDetails` may also be entered directly (details-only runs and
/// failure retries) and re-entered after `Done`, which is how a finished run
/// picks up keys that are still not successful.
use std::fmt;

/// Represents the current phase of a harvest pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelinePhase {
    /// Nothing has run yet
    Idle,

    /// Paging through listing pages and collecting detail URLs
    DiscoveringListings,

    /// Fetching and extracting detail pages in batches
    ExtractingDetails,

    /// The last phase finished; another pass may start
    Done,
}

impl PipelinePhase {
    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: PipelinePhase) -> bool {
        use PipelinePhase::*;

        matches!(
            (self, next),
            (Idle, DiscoveringListings)
                | (Idle, ExtractingDetails)
                | (DiscoveringListings, ExtractingDetails)
                | (DiscoveringListings, Done)
                | (ExtractingDetails, Done)
                | (Done, DiscoveringListings)
                | (Done, ExtractingDetails)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DiscoveringListings => "discovering_listings",
            Self::ExtractingDetails => "extracting_details",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

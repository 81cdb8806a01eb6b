//! State management module for Programme-Harvest
//!
//! This module tracks which phase the harvest driver is in and which phase
//! changes are legal.

mod phase;

pub use phase::PipelinePhase;

//! Shared data models for the Sleuth backend.
//!
//! This crate provides Serde-serializable types for:
//! - Bounding boxes and person detections
//! - Person crops and cross-frame tracks
//! - Suspect matches from the clothing matcher
//! - Analysis status, phases and progress projections
//! - Pipeline statistics

pub mod analysis;
pub mod bbox;
pub mod crop;
pub mod detection;
pub mod matching;
pub mod stats;
pub mod track;

// Re-export common types
pub use analysis::{
    AnalysisParams, AnalysisPhase, AnalysisResultResponse, AnalysisStatus, AnalysisStatusResponse,
    AnalysisSummary, MovementSummary, StartAnalysisResponse, TargetMovement, TimelineEntry,
};
pub use bbox::BBox;
pub use crop::Crop;
pub use detection::Detection;
pub use matching::{SuspectMatch, TargetMatch};
pub use stats::PipelineStats;
pub use track::{format_timestamp, Track, TrackId};

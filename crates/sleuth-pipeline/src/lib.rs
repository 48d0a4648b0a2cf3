//! Staged concurrent video-analysis pipeline for suspect search.
//!
//! One analysis runs as a set of cooperating tokio tasks connected by
//! bounded channels:
//!
//! decoder -> quality gate -> detection batcher -> track registry ->
//! matching batcher, with a shared termination coordinator feeding
//! high-confidence information back upstream.
//!
//! The [`registry::AnalysisRegistry`] is the process-wide entry point:
//! it spawns pipeline tasks, serves progress projections and compiled
//! results, and owns cancellation.

pub mod batch;
pub mod config;
pub mod detect;
pub mod error;
pub mod gate;
pub mod matching;
pub mod registry;
pub mod result;
mod runner;
pub mod stats;
pub mod termination;
pub mod tracks;

pub use config::PipelineConfig;
pub use detect::{run_detection_stage, FrameDetections};
pub use error::{AnalysisLookupError, PipelineError, PipelineResult};
pub use gate::{FrameGate, QualityDecision, SkipReason};
pub use matching::run_matching_stage;
pub use registry::{AnalysisRegistry, AnalysisState, SharedState};
pub use result::{compile_results, reconcile_matches, CompiledResults};
pub use stats::StatsCollector;
pub use termination::TerminationCoordinator;
pub use tracks::{TrackObservation, TrackRegistry};

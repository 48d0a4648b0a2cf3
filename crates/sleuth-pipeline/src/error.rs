//! Pipeline error types.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort an analysis.
///
/// Upstream HTTP failures never appear here; stages log and discard them.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Decoding failed: {0}")]
    Media(#[from] sleuth_media::MediaError),

    #[error("Pipeline task panicked: {0}")]
    TaskPanicked(String),
}

impl PipelineError {
    pub fn task_panicked(msg: impl std::fmt::Display) -> Self {
        Self::TaskPanicked(msg.to_string())
    }
}

/// Errors surfaced by analysis lookups.
#[derive(Debug, Error)]
pub enum AnalysisLookupError {
    #[error("Analysis not found")]
    NotFound,

    #[error("Analysis not ready: {progress_percent}% complete")]
    NotReady { progress_percent: u8 },

    #[error("Analysis failed: {message}")]
    Failed { message: String },
}

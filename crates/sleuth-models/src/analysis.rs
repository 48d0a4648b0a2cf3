//! Analysis workflow data models.
//!
//! This module provides types for the video analysis workflow:
//! 1. Start: upload a video, spawn the pipeline, return an analysis ID
//! 2. Poll: project live pipeline state into a status response
//! 3. Fetch: return the compiled timeline, crops and movement summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crop::Crop;
use crate::stats::PipelineStats;

/// Status of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Pipeline is running
    #[default]
    Processing,
    /// Analysis completed successfully
    Completed,
    /// Analysis failed
    Failed,
}

impl AnalysisStatus {
    /// Returns the status as a string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns true if the status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Current phase of a running analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisPhase {
    /// Decoding and quality-gating sampled frames
    #[default]
    FrameExtraction,
    /// Batched person detection and track building
    PersonDetection,
    /// Batched clothing matching against registered targets
    SuspectMatching,
    /// Compiling timeline, crops and movement summary
    ResultCompilation,
    /// Terminal phase
    Completed,
}

impl AnalysisPhase {
    /// Returns the phase as a string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FrameExtraction => "frame_extraction",
            Self::PersonDetection => "person_detection",
            Self::SuspectMatching => "suspect_matching",
            Self::ResultCompilation => "result_compilation",
            Self::Completed => "completed",
        }
    }

    /// Ordering index; phases only move forward.
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::FrameExtraction => 0,
            Self::PersonDetection => 1,
            Self::SuspectMatching => 2,
            Self::ResultCompilation => 3,
            Self::Completed => 4,
        }
    }

    /// Human-readable description shown to status pollers.
    pub fn description(&self) -> &'static str {
        match self {
            Self::FrameExtraction => "Extracting frames with quality-based skipping",
            Self::PersonDetection => "Detecting persons in batched frames",
            Self::SuspectMatching => "Matching unique persons against registered targets",
            Self::ResultCompilation => "Compiling timeline and movement summary",
            Self::Completed => "Analysis complete",
        }
    }
}

/// Caller-supplied parameters for one analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Seconds between sampled frames (0 means every frame)
    pub sample_interval_secs: f64,
    /// Realtime mode: abort the whole pipeline on the first >= 0.95 match
    pub stop_on_detect: bool,
    /// Free-form camera location, echoed back in summaries
    #[serde(default)]
    pub location: String,
    /// Free-form recording date, echoed back in summaries
    #[serde(default)]
    pub date: String,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            sample_interval_secs: 3.0,
            stop_on_detect: false,
            location: String::new(),
            date: String::new(),
        }
    }
}

/// Response from starting an analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartAnalysisResponse {
    pub analysis_id: String,
    /// Always `"analysis_started"`
    pub status: String,
}

impl StartAnalysisResponse {
    pub fn new(analysis_id: impl Into<String>) -> Self {
        Self {
            analysis_id: analysis_id.into(),
            status: "analysis_started".to_string(),
        }
    }
}

/// Response from polling analysis status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisStatusResponse {
    pub analysis_id: String,
    pub status: AnalysisStatus,
    /// Overall progress in `0..=100`
    pub progress_percent: u8,
    pub phase: AnalysisPhase,
    pub phase_description: String,
    pub tracks_found: u64,
    pub crops_ready: u64,
    pub high_confidence_seen: bool,
    pub stats: PipelineStats,
    /// Seconds elapsed (live) or total processing time (terminal)
    pub processing_time_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// One timeline entry per appearance frame of a matched track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub target_id: String,
    pub track_id: String,
    pub similarity: f64,
    pub confidence: f64,
    /// Appearance timestamp in seconds
    pub timestamp: f64,
    /// `MM:SS` rendering of the timestamp
    pub timestamp_str: String,
}

/// Movement of one target through the footage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetMovement {
    pub target_id: String,
    pub total_appearances: usize,
    /// First appearance, `MM:SS`
    pub entry_time: String,
    /// Last appearance, `MM:SS`
    pub exit_time: String,
    pub duration_seconds: f64,
    pub avg_similarity: f64,
    pub max_similarity: f64,
}

/// Per-target movement analysis over the whole run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementSummary {
    pub total_targets: usize,
    pub targets_detected: Vec<String>,
    pub movements: Vec<TargetMovement>,
    pub total_detections: usize,
}

/// Response from fetching a completed analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResultResponse {
    pub analysis_id: String,
    pub status: AnalysisStatus,
    pub timeline: Vec<TimelineEntry>,
    pub crops: Vec<Crop>,
    pub movement_summary: MovementSummary,
    pub stats: PipelineStats,
    pub processing_time_seconds: f64,
    /// When the analysis was started
    pub started_at: DateTime<Utc>,
    /// Echo of the caller-supplied metadata
    pub location: String,
    pub date: String,
}

/// One row of the `list_analyses` projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub analysis_id: String,
    pub status: AnalysisStatus,
    pub progress_percent: u8,
    pub matches_found: u64,
    pub processing_time_seconds: f64,
}

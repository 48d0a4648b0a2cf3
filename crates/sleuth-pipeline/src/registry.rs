//! Analysis registry: process-wide map of live and finished analyses.
//!
//! The only shared state across analyses. Map access goes through a
//! read-write lock; writers are status transitions and progress updates
//! made by the per-analysis pipeline task.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempfile::TempPath;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use sleuth_ml_client::{DetectorClient, MatcherClient};
use sleuth_models::{
    AnalysisParams, AnalysisPhase, AnalysisResultResponse, AnalysisStatus, AnalysisStatusResponse,
    AnalysisSummary, PipelineStats,
};

use crate::config::PipelineConfig;
use crate::error::AnalysisLookupError;
use crate::result::CompiledResults;
use crate::runner::{self, AnalysisJob};
use crate::termination::TerminationCoordinator;

/// Mutable state of one analysis, shared between the pipeline task and API
/// readers.
#[derive(Debug)]
pub struct AnalysisState {
    pub analysis_id: String,
    pub params: AnalysisParams,
    pub status: AnalysisStatus,
    pub phase: AnalysisPhase,
    pub progress_percent: u8,
    pub stats: PipelineStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub results: Option<CompiledResults>,
}

impl AnalysisState {
    fn new(analysis_id: impl Into<String>, params: AnalysisParams) -> Self {
        Self {
            analysis_id: analysis_id.into(),
            params,
            status: AnalysisStatus::Processing,
            phase: AnalysisPhase::FrameExtraction,
            progress_percent: 0,
            stats: PipelineStats::default(),
            started_at: Utc::now(),
            finished_at: None,
            error_message: None,
            results: None,
        }
    }

    /// Elapsed seconds while live, total processing time once terminal.
    pub fn processing_time_seconds(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    fn status_response(&self) -> AnalysisStatusResponse {
        AnalysisStatusResponse {
            analysis_id: self.analysis_id.clone(),
            status: self.status,
            progress_percent: self.progress_percent,
            phase: self.phase,
            phase_description: self.phase.description().to_string(),
            tracks_found: self.stats.tracks_found,
            crops_ready: self
                .results
                .as_ref()
                .map(|r| r.crops.len() as u64)
                .unwrap_or(self.stats.matches_found),
            high_confidence_seen: self.stats.high_confidence_seen,
            stats: self.stats.clone(),
            processing_time_seconds: self.processing_time_seconds(),
            error_message: self.error_message.clone(),
        }
    }
}

/// Shared handle to one analysis's state.
pub type SharedState = Arc<RwLock<AnalysisState>>;

struct AnalysisEntry {
    state: SharedState,
    coordinator: TerminationCoordinator,
}

/// Process-wide registry mapping analysis IDs to pipeline state.
pub struct AnalysisRegistry {
    config: Arc<PipelineConfig>,
    detector: Arc<DetectorClient>,
    matcher: Arc<MatcherClient>,
    analyses: RwLock<HashMap<String, AnalysisEntry>>,
}

impl AnalysisRegistry {
    pub fn new(config: PipelineConfig, detector: DetectorClient, matcher: MatcherClient) -> Self {
        Self {
            config: Arc::new(config),
            detector: Arc::new(detector),
            matcher: Arc::new(matcher),
            analyses: RwLock::new(HashMap::new()),
        }
    }

    /// The detector client, shared with health probing.
    pub fn detector(&self) -> &Arc<DetectorClient> {
        &self.detector
    }

    /// Start an analysis over an uploaded video.
    ///
    /// The temp file travels with the pipeline task and is removed when the
    /// analysis terminates, success or failure.
    pub async fn start(&self, video: TempPath, params: AnalysisParams) -> String {
        let analysis_id = Uuid::new_v4().to_string();
        let state: SharedState = Arc::new(RwLock::new(AnalysisState::new(&analysis_id, params.clone())));
        let coordinator = TerminationCoordinator::new();

        self.analyses.write().await.insert(
            analysis_id.clone(),
            AnalysisEntry {
                state: Arc::clone(&state),
                coordinator: coordinator.clone(),
            },
        );

        let job = AnalysisJob {
            analysis_id: analysis_id.clone(),
            state,
            config: Arc::clone(&self.config),
            detector: Arc::clone(&self.detector),
            matcher: Arc::clone(&self.matcher),
            coordinator,
            video,
            params,
        };
        tokio::spawn(runner::run_analysis(job));

        metrics::counter!("sleuth_analyses_started_total").increment(1);
        info!(analysis = %analysis_id, "Analysis started");
        analysis_id
    }

    /// Project the live state of one analysis.
    pub async fn status(&self, analysis_id: &str) -> Option<AnalysisStatusResponse> {
        let analyses = self.analyses.read().await;
        let entry = analyses.get(analysis_id)?;
        let response = entry.state.read().await.status_response();
        Some(response)
    }

    /// Fetch the compiled result of a completed analysis.
    pub async fn result(
        &self,
        analysis_id: &str,
    ) -> Result<AnalysisResultResponse, AnalysisLookupError> {
        let analyses = self.analyses.read().await;
        let entry = analyses
            .get(analysis_id)
            .ok_or(AnalysisLookupError::NotFound)?;
        let state = entry.state.read().await;

        match state.status {
            AnalysisStatus::Processing => Err(AnalysisLookupError::NotReady {
                progress_percent: state.progress_percent,
            }),
            AnalysisStatus::Failed => Err(AnalysisLookupError::Failed {
                message: state
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            }),
            AnalysisStatus::Completed => {
                let results = state.results.clone().unwrap_or_default();
                Ok(AnalysisResultResponse {
                    analysis_id: state.analysis_id.clone(),
                    status: state.status,
                    timeline: results.timeline,
                    crops: results.crops,
                    movement_summary: results.movement,
                    stats: state.stats.clone(),
                    processing_time_seconds: state.processing_time_seconds(),
                    started_at: state.started_at,
                    location: state.params.location.clone(),
                    date: state.params.date.clone(),
                })
            }
        }
    }

    /// Remove an analysis; a live run is cancelled first.
    pub async fn delete(&self, analysis_id: &str) -> bool {
        let removed = self.analyses.write().await.remove(analysis_id);
        match removed {
            Some(entry) => {
                entry.coordinator.cancel();
                info!(analysis = %analysis_id, "Analysis deleted");
                true
            }
            None => false,
        }
    }

    /// Summaries of all known analyses.
    pub async fn list(&self) -> Vec<AnalysisSummary> {
        let analyses = self.analyses.read().await;
        let mut summaries = Vec::with_capacity(analyses.len());
        for entry in analyses.values() {
            let state = entry.state.read().await;
            summaries.push(AnalysisSummary {
                analysis_id: state.analysis_id.clone(),
                status: state.status,
                progress_percent: state.progress_percent,
                matches_found: state.stats.matches_found,
                processing_time_seconds: state.processing_time_seconds(),
            });
        }
        summaries
    }

    /// Number of analyses currently processing.
    pub async fn active_count(&self) -> usize {
        let analyses = self.analyses.read().await;
        let mut active = 0;
        for entry in analyses.values() {
            if entry.state.read().await.status == AnalysisStatus::Processing {
                active += 1;
            }
        }
        active
    }
}

//! Application state.

use std::sync::Arc;

use sleuth_ml_client::{DetectorClient, MatcherClient, MlClientError};
use sleuth_pipeline::{AnalysisRegistry, PipelineConfig};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub analyses: Arc<AnalysisRegistry>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig) -> Result<Self, MlClientError> {
        let detector = DetectorClient::new(&config.detector_url)?;
        let matcher = MatcherClient::new(&config.matcher_url)?;
        let analyses = AnalysisRegistry::new(PipelineConfig::from_env(), detector, matcher);

        Ok(Self {
            config,
            analyses: Arc::new(analyses),
        })
    }
}

//! Health check handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_analyses: usize,
    /// Whether the upstream detector reports its model as loaded; degrades
    /// to `false` when the detector is unreachable.
    pub model_loaded: bool,
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_loaded = match state.analyses.detector().health().await {
        Ok(health) => health.model_loaded,
        Err(_) => false,
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_analyses: state.analyses.active_count().await,
        model_loaded,
    })
}

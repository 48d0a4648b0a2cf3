//! Analysis lifecycle handlers.

use std::io::Write;

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use sleuth_models::{
    AnalysisParams, AnalysisResultResponse, AnalysisStatusResponse, AnalysisSummary,
    StartAnalysisResponse,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `POST /analyze_video`: spool the upload to a scratch file and start the
/// pipeline in the background.
pub async fn start_analysis(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<StartAnalysisResponse>> {
    let mut params = AnalysisParams::default();
    let mut video: Option<tempfile::NamedTempFile> = None;
    let mut filename = String::new();

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("video_file") => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                if !content_type.starts_with("video/") {
                    return Err(ApiError::bad_request("Only video uploads are accepted"));
                }
                filename = field.file_name().unwrap_or("upload.mp4").to_string();

                let bytes = field.bytes().await?;
                let mut temp = tempfile::Builder::new()
                    .prefix("sleuth-upload-")
                    .suffix(".mp4")
                    .tempfile()
                    .map_err(|e| ApiError::internal(format!("scratch file: {e}")))?;
                temp.write_all(&bytes)
                    .map_err(|e| ApiError::internal(format!("scratch write: {e}")))?;
                video = Some(temp);
            }
            Some("fps_interval") => {
                let text = field.text().await?;
                let interval: f64 = text
                    .parse()
                    .map_err(|_| ApiError::bad_request("fps_interval must be a number"))?;
                if interval < 0.0 {
                    return Err(ApiError::bad_request("fps_interval must be non-negative"));
                }
                params.sample_interval_secs = interval;
            }
            Some("stop_on_detect") => {
                let text = field.text().await?;
                params.stop_on_detect = matches!(text.as_str(), "true" | "1" | "on");
            }
            Some("location") => params.location = field.text().await?,
            Some("date") => params.date = field.text().await?,
            _ => {}
        }
    }

    let video = video.ok_or_else(|| ApiError::bad_request("Missing video_file field"))?;
    let analysis_id = state.analyses.start(video.into_temp_path(), params).await;

    info!(analysis = %analysis_id, file = %filename, "Video analysis requested");
    Ok(Json(StartAnalysisResponse::new(analysis_id)))
}

/// `GET /analysis_status/{analysis_id}`.
pub async fn analysis_status(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> ApiResult<Json<AnalysisStatusResponse>> {
    state
        .analyses
        .status(&analysis_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Unknown analysis ID"))
}

/// `GET /analysis_result/{analysis_id}`: 400 while processing, 500 with
/// the recorded message when failed.
pub async fn analysis_result(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> ApiResult<Json<AnalysisResultResponse>> {
    let result = state.analyses.result(&analysis_id).await?;
    Ok(Json(result))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// `DELETE /analysis/{analysis_id}`: cancels a live run.
pub async fn delete_analysis(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    if state.analyses.delete(&analysis_id).await {
        Ok(Json(DeleteResponse {
            message: format!("Analysis {analysis_id} deleted"),
        }))
    } else {
        Err(ApiError::not_found("Unknown analysis ID"))
    }
}

#[derive(Serialize)]
pub struct ListAnalysesResponse {
    pub total_analyses: usize,
    pub analyses: Vec<AnalysisSummary>,
}

/// `GET /list_analyses`.
pub async fn list_analyses(State(state): State<AppState>) -> Json<ListAnalysesResponse> {
    let analyses = state.analyses.list().await;
    Json(ListAnalysesResponse {
        total_analyses: analyses.len(),
        analyses,
    })
}

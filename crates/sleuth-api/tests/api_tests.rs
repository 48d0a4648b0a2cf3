//! API router tests.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use sleuth_api::{create_router, ApiConfig, AppState};

fn test_config() -> ApiConfig {
    ApiConfig {
        // Unreachable upstreams: handlers must degrade, not fail.
        detector_url: "http://127.0.0.1:9".to_string(),
        matcher_url: "http://127.0.0.1:9".to_string(),
        ..ApiConfig::default()
    }
}

fn test_router() -> axum::Router {
    let state = AppState::new(test_config()).expect("state");
    create_router(state, None)
}

#[tokio::test]
async fn health_endpoint_degrades_without_detector() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["active_analyses"], 0);
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn status_of_unknown_analysis_is_404() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/analysis_status/no-such-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn result_of_unknown_analysis_is_404() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/analysis_result/no-such-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_of_unknown_analysis_is_404() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/analysis/no-such-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_analyses_starts_empty() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/list_analyses")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["total_analyses"], 0);
}

#[tokio::test]
async fn analyze_video_without_file_is_400() {
    let app = test_router();

    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"location\"\r\n\r\nlobby\r\n--{boundary}--\r\n"
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/analyze_video")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analyze_video_rejects_non_video_upload() {
    let app = test_router();

    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"video_file\"; filename=\"notes.txt\"\r\nContent-Type: text/plain\r\n\r\nhello\r\n--{boundary}--\r\n"
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/analyze_video")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

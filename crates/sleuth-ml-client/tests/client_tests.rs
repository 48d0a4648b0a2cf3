//! Wiremock-backed tests for the inference service clients.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sleuth_ml_client::{DetectorClient, MatcherClient, MlClientError};

fn png_stub() -> Vec<u8> {
    // Payload content is irrelevant to the wire contract under test.
    vec![0x89, 0x50, 0x4e, 0x47]
}

#[tokio::test]
async fn detect_parses_person_detections() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "results": {
                "total_detections": 2,
                "all_detections": [
                    {
                        "class_id": 0,
                        "class_name": "person",
                        "confidence": 0.91,
                        "bbox": {"x1": 100.0, "y1": 50.0, "x2": 180.0, "y2": 260.0}
                    },
                    {
                        "class_id": 2,
                        "class_name": "car",
                        "confidence": 0.75,
                        "bbox": {"x1": 0.0, "y1": 0.0, "x2": 50.0, "y2": 40.0}
                    }
                ],
                "person_count": 1
            }
        })))
        .mount(&server)
        .await;

    let client = DetectorClient::new(server.uri()).unwrap();
    let detections = client.detect(png_stub(), 0.25, true).await.unwrap();

    assert_eq!(detections.len(), 2);
    assert!(detections[0].is_person());
    assert!((detections[0].confidence - 0.91).abs() < 1e-6);
    assert_eq!(detections[0].bbox.x2, 180.0);
    assert!(!detections[1].is_person());
}

#[tokio::test]
async fn detect_surfaces_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;

    let client = DetectorClient::new(server.uri()).unwrap();
    let err = client.detect(png_stub(), 0.25, false).await.unwrap_err();

    match err {
        MlClientError::UnexpectedStatus { status, .. } => assert_eq!(status, 500),
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn detect_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = DetectorClient::with_timeout(server.uri(), Duration::from_millis(100)).unwrap();
    let err = client.detect(png_stub(), 0.25, false).await.unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn detector_health_reports_model_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "model_loaded": true
        })))
        .mount(&server)
        .await;

    let client = DetectorClient::new(server.uri()).unwrap();
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert!(health.model_loaded);
}

#[tokio::test]
async fn register_target_parses_feature_dimension() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/register_person"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "person_id": "suspect_a",
            "feature_dimension": 1280
        })))
        .mount(&server)
        .await;

    let client = MatcherClient::new(server.uri()).unwrap();
    let response = client.register_target("suspect_a", png_stub()).await.unwrap();
    assert_eq!(response.status, "success");
    assert_eq!(response.feature_dimension, 1280);
}

#[tokio::test]
async fn identify_parses_matches() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identify_person"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "matches_found": 2,
            "matches": [
                {"suspect_id": "suspect_a", "similarity": 0.97, "confidence": 0.9},
                {"suspect_id": "suspect_b", "similarity": 0.62, "confidence": 0.5}
            ]
        })))
        .mount(&server)
        .await;

    let client = MatcherClient::new(server.uri()).unwrap();
    let response = client.identify(png_stub(), 0.6).await.unwrap();

    assert_eq!(response.matches_found, 2);
    assert_eq!(response.matches[0].target_id, "suspect_a");
    assert!(response.matches[0].similarity >= 0.95);
}

#[tokio::test]
async fn identify_handles_empty_matches() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identify_person"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "matches_found": 0,
            "matches": []
        })))
        .mount(&server)
        .await;

    let client = MatcherClient::new(server.uri()).unwrap();
    let response = client.identify(png_stub(), 0.6).await.unwrap();
    assert!(response.matches.is_empty());
}

#[tokio::test]
async fn list_and_delete_targets() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/registered_persons"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "person_ids": ["suspect_a", "suspect_b"],
            "total_persons": 2
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/person/suspect_a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .mount(&server)
        .await;

    let client = MatcherClient::new(server.uri()).unwrap();
    let targets = client.list_targets().await.unwrap();
    assert_eq!(targets.total_persons, 2);
    assert_eq!(targets.person_ids.len(), 2);

    client.delete_target("suspect_a").await.unwrap();
}

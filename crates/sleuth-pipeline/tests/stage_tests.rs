//! Wiremock-backed tests for the batching stages.

use std::io::Cursor;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, Rgb, RgbImage};
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sleuth_media::Frame;
use sleuth_ml_client::{DetectorClient, MatcherClient};
use sleuth_models::{BBox, Crop, Track};
use sleuth_pipeline::{
    run_detection_stage, run_matching_stage, PipelineConfig, TerminationCoordinator,
};

fn frame(index: u64, timestamp: f64) -> Frame {
    Frame {
        index,
        sample_index: index / 30,
        timestamp,
        width: 320,
        height: 240,
        image: RgbImage::from_pixel(320, 240, Rgb([90, 90, 90])),
    }
}

fn crop_png_base64() -> String {
    let image = RgbImage::from_pixel(60, 150, Rgb([120, 40, 40]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buf, image::ImageOutputFormat::Png)
        .unwrap();
    STANDARD.encode(buf.into_inner())
}

fn track(id: &str, quality: f32) -> Track {
    Track::new(
        id.to_string(),
        0,
        0.0,
        Crop {
            image_base64: crop_png_base64(),
            bbox: BBox::new(100.0, 50.0, 160.0, 200.0),
            width: 60,
            height: 150,
            quality,
        },
        0.9,
    )
}

fn detect_body(confidence: f64) -> serde_json::Value {
    json!({
        "status": "success",
        "results": {
            "total_detections": 1,
            "all_detections": [{
                "class_id": 0,
                "class_name": "person",
                "confidence": confidence,
                "bbox": {"x1": 100.0, "y1": 50.0, "x2": 160.0, "y2": 200.0}
            }],
            "person_count": 1
        }
    })
}

#[tokio::test]
async fn detection_stage_preserves_source_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detect_body(0.9)))
        .mount(&server)
        .await;

    let config = Arc::new(PipelineConfig::default());
    let detector = Arc::new(DetectorClient::new(server.uri()).unwrap());
    let coordinator = TerminationCoordinator::new();

    let (frames_tx, frames_rx) = mpsc::channel(8);
    let (results_tx, mut results_rx) = mpsc::channel(8);

    let stage = tokio::spawn(run_detection_stage(
        config,
        detector,
        coordinator,
        frames_rx,
        results_tx,
    ));

    for i in 0..5u64 {
        frames_tx.send(frame(i * 30, i as f64)).await.unwrap();
    }
    drop(frames_tx);

    let mut seen = Vec::new();
    while let Some(result) = results_rx.recv().await {
        assert_eq!(result.detections.len(), 1);
        assert!(result.detections[0].is_person());
        seen.push(result.frame.index);
    }
    stage.await.unwrap();

    assert_eq!(seen, vec![0, 30, 60, 90, 120]);
}

#[tokio::test]
async fn detection_stage_tolerates_server_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let config = Arc::new(PipelineConfig::default());
    let detector = Arc::new(DetectorClient::new(server.uri()).unwrap());
    let coordinator = TerminationCoordinator::new();

    let (frames_tx, frames_rx) = mpsc::channel(8);
    let (results_tx, mut results_rx) = mpsc::channel(8);

    let stage = tokio::spawn(run_detection_stage(
        config,
        detector,
        coordinator,
        frames_rx,
        results_tx,
    ));

    for i in 0..4u64 {
        frames_tx.send(frame(i, i as f64)).await.unwrap();
    }
    drop(frames_tx);

    // Every request fails; every frame drops; the stage still finishes
    // cleanly instead of aborting the pipeline.
    assert!(results_rx.recv().await.is_none());
    stage.await.unwrap();
}

#[tokio::test]
async fn matching_stage_retains_best_candidate_per_track() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identify_person"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "matches_found": 2,
            "matches": [
                {"suspect_id": "suspect_a", "similarity": 0.72, "confidence": 0.6},
                {"suspect_id": "suspect_b", "similarity": 0.65, "confidence": 0.5}
            ]
        })))
        .mount(&server)
        .await;

    let config = Arc::new(PipelineConfig::default());
    let matcher = Arc::new(MatcherClient::new(server.uri()).unwrap());
    let coordinator = TerminationCoordinator::new();

    let (tracks_tx, tracks_rx) = mpsc::channel(4);
    let stage = tokio::spawn(run_matching_stage(
        config,
        matcher,
        coordinator.clone(),
        false,
        tracks_rx,
    ));

    tracks_tx.send(track("person_01", 0.9)).await.unwrap();
    drop(tracks_tx);

    let matches = stage.await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].target_id, "suspect_a");
    assert!((matches[0].similarity - 0.72).abs() < 1e-9);
    assert!(!coordinator.high_confidence_seen());
}

#[tokio::test]
async fn matching_stage_drops_candidates_below_threshold() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identify_person"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "matches_found": 1,
            "matches": [
                {"suspect_id": "suspect_a", "similarity": 0.4, "confidence": 0.3}
            ]
        })))
        .mount(&server)
        .await;

    let config = Arc::new(PipelineConfig::default());
    let matcher = Arc::new(MatcherClient::new(server.uri()).unwrap());
    let coordinator = TerminationCoordinator::new();

    let (tracks_tx, tracks_rx) = mpsc::channel(4);
    let stage = tokio::spawn(run_matching_stage(
        config,
        matcher,
        coordinator,
        false,
        tracks_rx,
    ));

    tracks_tx.send(track("person_01", 0.9)).await.unwrap();
    drop(tracks_tx);

    let matches = stage.await.unwrap();
    assert!(matches.is_empty());
}

#[tokio::test]
async fn matching_stage_realtime_cancels_on_high_confidence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identify_person"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "matches_found": 1,
            "matches": [
                {"suspect_id": "suspect_a", "similarity": 0.97, "confidence": 0.95}
            ]
        })))
        .mount(&server)
        .await;

    let config = Arc::new(PipelineConfig::default());
    let matcher = Arc::new(MatcherClient::new(server.uri()).unwrap());
    let coordinator = TerminationCoordinator::new();

    let (tracks_tx, tracks_rx) = mpsc::channel(4);
    let stage = tokio::spawn(run_matching_stage(
        config,
        matcher,
        coordinator.clone(),
        true,
        tracks_rx,
    ));

    tracks_tx.send(track("person_01", 0.9)).await.unwrap();

    let matches = stage.await.unwrap();
    assert_eq!(matches.len(), 1);
    assert!(coordinator.high_confidence_seen());
    assert!(coordinator.is_cancelled());

    // The matcher exited; later tracks have nowhere to go.
    assert!(tracks_tx.send(track("person_02", 0.5)).await.is_err());
}

#[tokio::test]
async fn matching_stage_normal_mode_continues_until_enough_matches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identify_person"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "matches_found": 1,
            "matches": [
                {"suspect_id": "suspect_a", "similarity": 0.96, "confidence": 0.9}
            ]
        })))
        .mount(&server)
        .await;

    let config = Arc::new(PipelineConfig::default());
    let matcher = Arc::new(MatcherClient::new(server.uri()).unwrap());
    let coordinator = TerminationCoordinator::new();

    let (tracks_tx, tracks_rx) = mpsc::channel(8);
    let stage = tokio::spawn(run_matching_stage(
        config,
        matcher,
        coordinator.clone(),
        false,
        tracks_rx,
    ));

    // Five candidate tracks; the first batch of three already satisfies
    // "high confidence seen and at least three matches", so the stage stops
    // without draining the rest.
    for i in 1..=5 {
        let _ = tracks_tx.send(track(&format!("person_{i:02}"), 0.9)).await;
    }
    drop(tracks_tx);

    let matches = stage.await.unwrap();
    assert!(matches.len() >= 3);
    assert!(coordinator.high_confidence_seen());
    assert!(!coordinator.is_cancelled());
}

#[tokio::test]
async fn matching_stage_tolerates_server_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identify_person"))
        .respond_with(ResponseTemplate::new(500).set_body_string("matcher down"))
        .mount(&server)
        .await;

    let config = Arc::new(PipelineConfig::default());
    let matcher = Arc::new(MatcherClient::new(server.uri()).unwrap());
    let coordinator = TerminationCoordinator::new();

    let (tracks_tx, tracks_rx) = mpsc::channel(4);
    let stage = tokio::spawn(run_matching_stage(
        config,
        matcher,
        coordinator,
        false,
        tracks_rx,
    ));

    tracks_tx.send(track("person_01", 0.9)).await.unwrap();
    drop(tracks_tx);

    let matches = stage.await.unwrap();
    assert!(matches.is_empty());
}

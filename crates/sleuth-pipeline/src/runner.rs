//! Per-analysis pipeline orchestration.
//!
//! Wires the stages together: decoder -> quality gate -> detection batcher
//! -> track registry -> matching batcher, all connected by bounded channels
//! and sharing one termination coordinator. Frames reach the registry in
//! source order; match results link back to tracks by ID.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use tempfile::TempPath;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use sleuth_media::{extract_crop, frame_quality, Frame, FrameDecoder, MediaResult};
use sleuth_ml_client::{DetectorClient, MatcherClient};
use sleuth_models::{AnalysisParams, AnalysisPhase, AnalysisStatus, PipelineStats, Track};

use crate::config::PipelineConfig;
use crate::detect::{run_detection_stage, FrameDetections};
use crate::error::{PipelineError, PipelineResult};
use crate::gate::FrameGate;
use crate::matching::run_matching_stage;
use crate::registry::SharedState;
use crate::result::{compile_results, reconcile_matches, CompiledResults};
use crate::stats::StatsCollector;
use crate::termination::TerminationCoordinator;
use crate::tracks::{TrackObservation, TrackRegistry};

/// Everything one analysis task needs.
pub(crate) struct AnalysisJob {
    pub analysis_id: String,
    pub state: SharedState,
    pub config: Arc<PipelineConfig>,
    pub detector: Arc<DetectorClient>,
    pub matcher: Arc<MatcherClient>,
    pub coordinator: TerminationCoordinator,
    pub video: TempPath,
    pub params: AnalysisParams,
}

/// Run one analysis to a terminal state.
pub(crate) async fn run_analysis(job: AnalysisJob) {
    let AnalysisJob {
        analysis_id,
        state,
        config,
        detector,
        matcher,
        coordinator,
        video,
        params,
    } = job;

    let stats = StatsCollector::new();
    let outcome = run_pipeline(
        &state,
        &config,
        &detector,
        &matcher,
        &coordinator,
        &stats,
        &video,
        &params,
    )
    .await;

    let finished_at = Utc::now();
    match outcome {
        Ok(results) => {
            info!(
                analysis = %analysis_id,
                matches = results.crops.len(),
                timeline = results.timeline.len(),
                "Analysis completed"
            );
            counter!("sleuth_analyses_completed_total").increment(1);

            let mut s = state.write().await;
            s.status = AnalysisStatus::Completed;
            s.phase = AnalysisPhase::Completed;
            s.progress_percent = 100;
            s.stats = stats.snapshot(coordinator.high_confidence_seen());
            s.finished_at = Some(finished_at);
            s.results = Some(results);
        }
        Err(e) => {
            error!(analysis = %analysis_id, error = %e, "Analysis failed");
            counter!("sleuth_analyses_failed_total").increment(1);

            let mut s = state.write().await;
            s.status = AnalysisStatus::Failed;
            s.finished_at = Some(finished_at);
            s.error_message = Some(e.to_string());
            s.stats = stats.snapshot(coordinator.high_confidence_seen());
        }
    }

    // Scratch video is removed on termination, success or failure.
    drop(video);
}

#[allow(clippy::too_many_arguments)]
async fn run_pipeline(
    state: &SharedState,
    config: &Arc<PipelineConfig>,
    detector: &Arc<DetectorClient>,
    matcher: &Arc<MatcherClient>,
    coordinator: &TerminationCoordinator,
    stats: &StatsCollector,
    video: &TempPath,
    params: &AnalysisParams,
) -> PipelineResult<CompiledResults> {
    let decoder = FrameDecoder::open(video.to_path_buf(), params.sample_interval_secs).await?;
    let duration = decoder.info().duration.max(f64::MIN_POSITIVE);
    let realtime = params.stop_on_detect;

    let (frames_tx, frames_rx) = mpsc::channel::<Frame>(config.detection_batch_size);
    let (gated_tx, gated_rx) = mpsc::channel::<Frame>(config.detection_batch_size);
    let (detected_tx, detected_rx) = mpsc::channel::<FrameDetections>(config.detection_batch_size);
    let (tracks_tx, tracks_rx) = mpsc::channel::<Track>(config.matching_batch_size);

    let decode_handle = tokio::spawn(decode_task(decoder, frames_tx, coordinator.clone()));
    let gate_handle = tokio::spawn(gate_task(
        Arc::clone(config),
        coordinator.clone(),
        stats.clone(),
        Arc::clone(state),
        duration,
        frames_rx,
        gated_tx,
    ));
    let detect_handle = tokio::spawn(run_detection_stage(
        Arc::clone(config),
        Arc::clone(detector),
        coordinator.clone(),
        gated_rx,
        detected_tx,
    ));
    let registry_handle = tokio::spawn(registry_task(
        Arc::clone(config),
        coordinator.clone(),
        stats.clone(),
        Arc::clone(state),
        realtime,
        detected_rx,
        tracks_tx,
    ));
    let matching_handle = tokio::spawn(run_matching_stage(
        Arc::clone(config),
        Arc::clone(matcher),
        coordinator.clone(),
        realtime,
        tracks_rx,
    ));

    let decode_result = decode_handle.await.map_err(|e| PipelineError::task_panicked(e))?;
    sync_state(state, Some(AnalysisPhase::PersonDetection), 20, None).await;

    gate_handle.await.map_err(|e| PipelineError::task_panicked(e))?;
    detect_handle.await.map_err(|e| PipelineError::task_panicked(e))?;
    let tracks = registry_handle
        .await
        .map_err(|e| PipelineError::task_panicked(e))?;
    let mut matches = matching_handle
        .await
        .map_err(|e| PipelineError::task_panicked(e))?;

    // A decode failure is fatal even when downstream stages produced
    // partial results.
    decode_result?;

    sync_state(state, Some(AnalysisPhase::ResultCompilation), 90, None).await;

    reconcile_matches(&mut matches, &tracks);
    stats.set_matches_found(matches.len() as u64);
    Ok(compile_results(&matches))
}

/// Decoder task: yields sampled frames until end of stream or cancellation.
async fn decode_task(
    mut decoder: FrameDecoder,
    frames_tx: mpsc::Sender<Frame>,
    coordinator: TerminationCoordinator,
) -> MediaResult<()> {
    loop {
        if coordinator.is_cancelled() {
            info!("Decoder cancelled; stopping frame reads");
            decoder.cancel().await;
            return Ok(());
        }
        match decoder.next_frame().await {
            Ok(Some(frame)) => {
                if frames_tx.send(frame).await.is_err() {
                    decoder.cancel().await;
                    return Ok(());
                }
            }
            Ok(None) => return Ok(()),
            Err(e) => return Err(e),
        }
    }
}

/// Quality-gate task: scores each sampled frame and forwards the keepers.
async fn gate_task(
    config: Arc<PipelineConfig>,
    coordinator: TerminationCoordinator,
    stats: StatsCollector,
    state: SharedState,
    duration: f64,
    mut frames_rx: mpsc::Receiver<Frame>,
    gated_tx: mpsc::Sender<Frame>,
) {
    let mut gate = FrameGate::new((*config).clone(), coordinator.clone());

    while let Some(frame) = frames_rx.recv().await {
        let quality = frame_quality(&frame.image);
        let decision = gate.decide(quality);
        stats.record_sampled(quality, decision.process);

        let percent = ((frame.timestamp / duration) * 20.0).min(20.0) as u8;
        let snapshot = stats.snapshot(coordinator.high_confidence_seen());
        sync_state(&state, None, percent, Some(snapshot)).await;

        if decision.process {
            counter!("sleuth_frames_processed_total").increment(1);
            if gated_tx.send(frame).await.is_err() {
                // Downstream is gone (cancelled); stop pulling frames so the
                // decoder shuts down too.
                break;
            }
        } else {
            counter!("sleuth_frames_skipped_total").increment(1);
            debug!(
                frame = frame.index,
                quality,
                reason = decision.reason.as_str(),
                "Frame skipped"
            );
        }
    }
}

/// Registry task: folds detections into tracks and feeds the matcher.
///
/// In realtime mode each new track streams to the matcher as soon as it is
/// discovered; in normal mode the registry is frozen when detections end
/// and tracks flush in descending crop-quality order.
async fn registry_task(
    config: Arc<PipelineConfig>,
    coordinator: TerminationCoordinator,
    stats: StatsCollector,
    state: SharedState,
    realtime: bool,
    mut detected_rx: mpsc::Receiver<FrameDetections>,
    tracks_tx: mpsc::Sender<Track>,
) -> Vec<Track> {
    let mut registry = TrackRegistry::new(&config);
    let mut frames_seen = 0u64;

    while let Some(FrameDetections { frame, detections }) = detected_rx.recv().await {
        for detection in &detections {
            let crop = match extract_crop(
                &frame,
                detection,
                config.min_crop_width,
                config.min_crop_height,
            ) {
                Ok(Some(crop)) => crop,
                // Degenerate or undersized box: detection discarded locally.
                Ok(None) => continue,
                Err(e) => {
                    warn!(frame = frame.index, error = %e, "Crop extraction failed; detection dropped");
                    continue;
                }
            };

            let observation =
                registry.observe(frame.index, frame.timestamp, crop, detection.confidence);

            if realtime {
                if let TrackObservation::New(track_id) = &observation {
                    if let Some(track) = registry.get(track_id) {
                        if tracks_tx.send(track.clone()).await.is_err() {
                            debug!("Matcher exited; no longer streaming tracks");
                        }
                    }
                }
            }
        }

        stats.set_tracks_found(registry.len() as u64);
        frames_seen += 1;

        let snapshot = stats.snapshot(coordinator.high_confidence_seen());
        let processed = snapshot.frames_processed.max(1);
        let percent = 20 + ((frames_seen as f64 / processed as f64) * 50.0).min(50.0) as u8;
        sync_state(&state, None, percent, Some(snapshot)).await;
    }

    let snapshot = stats.snapshot(coordinator.high_confidence_seen());
    sync_state(&state, Some(AnalysisPhase::SuspectMatching), 70, Some(snapshot)).await;

    let frozen = registry.into_tracks_by_quality();
    if !realtime && !coordinator.is_cancelled() {
        for track in &frozen {
            if tracks_tx.send(track.clone()).await.is_err() {
                break;
            }
        }
    }
    frozen
}

/// Monotonic state update: progress never regresses, phases only advance.
pub(crate) async fn sync_state(
    state: &SharedState,
    phase: Option<AnalysisPhase>,
    percent: u8,
    stats: Option<PipelineStats>,
) {
    let mut s = state.write().await;
    if let Some(phase) = phase {
        if phase.ordinal() > s.phase.ordinal() {
            s.phase = phase;
        }
    }
    if s.progress_percent < percent {
        s.progress_percent = percent;
    }
    if let Some(stats) = stats {
        s.stats = stats;
    }
}

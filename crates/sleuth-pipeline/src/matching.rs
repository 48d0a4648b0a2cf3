//! Matching batching stage.
//!
//! Flushes track crops to the clothing matcher in small concurrent batches,
//! retains the single best candidate per track at or above the retention
//! threshold, and drives the termination coordinator when a high-confidence
//! match appears.

use std::cmp::Ordering;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use sleuth_ml_client::MatcherClient;
use sleuth_models::{SuspectMatch, TargetMatch, Track};

use crate::batch::fill_batch;
use crate::config::PipelineConfig;
use crate::termination::TerminationCoordinator;

/// Run the matching stage until the track channel closes or a stop rule
/// fires.
///
/// Stop rules, evaluated after each batch:
/// - realtime mode: a high-confidence match cancels the whole pipeline
/// - normal mode: stop once high confidence was seen and at least
///   `normal_mode_min_matches` matches were retained
pub async fn run_matching_stage(
    config: Arc<PipelineConfig>,
    matcher: Arc<MatcherClient>,
    coordinator: TerminationCoordinator,
    stop_on_detect: bool,
    mut tracks_rx: mpsc::Receiver<Track>,
) -> Vec<SuspectMatch> {
    let mut matches: Vec<SuspectMatch> = Vec::new();

    loop {
        let first = match tracks_rx.recv().await {
            Some(track) => track,
            None => break,
        };
        if coordinator.is_cancelled() {
            break;
        }

        let (batch, closed) = fill_batch(
            &mut tracks_rx,
            first,
            config.matching_batch_size,
            config.batch_timeout,
        )
        .await;

        debug!(tracks = batch.len(), "Dispatching matching batch");

        let results = join_all(batch.iter().map(|track| {
            let matcher = Arc::clone(&matcher);
            let threshold = config.match_threshold;
            async move { identify_track(&matcher, track, threshold).await }
        }))
        .await;

        for (track, candidate) in batch.iter().zip(results) {
            let Some(candidate) = candidate else { continue };

            info!(
                track = %track.track_id,
                target = %candidate.target_id,
                similarity = candidate.similarity,
                "Suspect match retained"
            );
            if candidate.similarity >= config.high_confidence_threshold {
                coordinator.set_high_confidence();
                info!(
                    target = %candidate.target_id,
                    similarity = candidate.similarity,
                    "High-confidence match observed; aggressive skipping enabled"
                );
            }
            matches.push(SuspectMatch::from_track(track, &candidate));
        }

        if coordinator.high_confidence_seen() {
            if stop_on_detect {
                info!("Realtime mode: cancelling pipeline on high-confidence match");
                coordinator.cancel();
                break;
            }
            if matches.len() as u64 >= config.normal_mode_min_matches {
                info!(
                    matches = matches.len(),
                    "High confidence seen with enough matches; stopping matcher"
                );
                break;
            }
        }

        if closed {
            break;
        }
    }

    matches
}

/// Query the matcher for one track; returns the single best candidate at or
/// above the retention threshold.
async fn identify_track(
    matcher: &MatcherClient,
    track: &Track,
    threshold: f64,
) -> Option<TargetMatch> {
    let png = match track.best_crop.png_bytes() {
        Ok(png) => png,
        Err(e) => {
            warn!(track = %track.track_id, error = %e, "Crop payload corrupt; track dropped");
            return None;
        }
    };

    match matcher.identify(png, threshold).await {
        Ok(response) => response
            .matches
            .into_iter()
            .filter(|m| m.similarity >= threshold)
            .max_by(|a, b| {
                a.similarity
                    .partial_cmp(&b.similarity)
                    .unwrap_or(Ordering::Equal)
            }),
        Err(e) => {
            warn!(track = %track.track_id, error = %e, "Identify request failed; track dropped");
            None
        }
    }
}

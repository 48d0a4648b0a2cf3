//! Result compilation.
//!
//! Turns the retained matches into the caller-facing timeline, crop set and
//! per-target movement summary.

use sleuth_models::{
    format_timestamp, Crop, MovementSummary, SuspectMatch, TargetMovement, TimelineEntry, Track,
};

/// Compiled output of one analysis.
#[derive(Debug, Clone, Default)]
pub struct CompiledResults {
    pub timeline: Vec<TimelineEntry>,
    pub crops: Vec<Crop>,
    pub movement: MovementSummary,
}

/// Refresh each match's appearance history from the final track state.
///
/// In realtime mode tracks are matched while still accumulating
/// appearances; reconciling against the frozen registry makes the timeline
/// cover the whole run.
pub fn reconcile_matches(matches: &mut [SuspectMatch], tracks: &[Track]) {
    for m in matches.iter_mut() {
        if let Some(track) = tracks.iter().find(|t| t.track_id == m.track_id) {
            m.appearance_frames = track.appearance_frames.clone();
            m.appearance_timestamps = track.appearance_timestamps.clone();
            m.first_timestamp = track.first_timestamp;
        }
    }
}

/// Compile the timeline, crop set and movement summary.
///
/// One timeline entry is emitted per appearance frame of each matched track
/// (not per match), preserving per-track chronological order; one crop is
/// emitted per match.
pub fn compile_results(matches: &[SuspectMatch]) -> CompiledResults {
    let mut timeline = Vec::new();
    let mut crops = Vec::new();

    for m in matches {
        for &timestamp in &m.appearance_timestamps {
            timeline.push(TimelineEntry {
                target_id: m.target_id.clone(),
                track_id: m.track_id.clone(),
                similarity: m.similarity,
                confidence: m.confidence,
                timestamp,
                timestamp_str: format_timestamp(timestamp),
            });
        }
        crops.push(m.crop.clone());
    }

    let movement = summarize_movement(&timeline);

    CompiledResults {
        timeline,
        crops,
        movement,
    }
}

/// Per-target movement: entry/exit, duration, appearance count, similarity
/// aggregates.
fn summarize_movement(timeline: &[TimelineEntry]) -> MovementSummary {
    // Group by target, preserving first-seen order.
    let mut order: Vec<String> = Vec::new();
    for entry in timeline {
        if !order.contains(&entry.target_id) {
            order.push(entry.target_id.clone());
        }
    }

    let mut movements = Vec::with_capacity(order.len());
    for target_id in &order {
        let mut appearances: Vec<&TimelineEntry> = timeline
            .iter()
            .filter(|e| &e.target_id == target_id)
            .collect();
        appearances.sort_by(|a, b| {
            a.timestamp
                .partial_cmp(&b.timestamp)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let first = appearances[0];
        let last = appearances[appearances.len() - 1];
        let avg_similarity =
            appearances.iter().map(|e| e.similarity).sum::<f64>() / appearances.len() as f64;
        let max_similarity = appearances
            .iter()
            .map(|e| e.similarity)
            .fold(0.0_f64, f64::max);

        movements.push(TargetMovement {
            target_id: target_id.clone(),
            total_appearances: appearances.len(),
            entry_time: format_timestamp(first.timestamp),
            exit_time: format_timestamp(last.timestamp),
            duration_seconds: last.timestamp - first.timestamp,
            avg_similarity,
            max_similarity,
        });
    }

    MovementSummary {
        total_targets: order.len(),
        targets_detected: order,
        total_detections: timeline.len(),
        movements,
    }
}

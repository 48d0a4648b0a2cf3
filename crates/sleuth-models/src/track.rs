//! Person tracks aggregated across frames.

use serde::{Deserialize, Serialize};

use crate::crop::Crop;

/// Stable per-analysis track identifier (`person_01`, `person_02`, ...).
pub type TrackId = String;

/// A candidate person identity discovered in the input video.
///
/// Tracks are aggregated across frames by spatial proximity; the expensive
/// identity work happens later in the clothing matcher. Each track keeps the
/// best-quality crop observed so far plus the ordered appearance history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Stable, monotonically assigned identifier
    pub track_id: TrackId,
    /// Index of the first sampled frame this track appeared in
    pub first_frame_index: u64,
    /// Timestamp (seconds) of the first appearance
    pub first_timestamp: f64,
    /// Best-quality crop observed so far
    pub best_crop: Crop,
    /// Detector confidence of the best crop's detection
    pub detector_confidence: f32,
    /// Ordered frame indices of every appearance
    pub appearance_frames: Vec<u64>,
    /// Parallel ordered timestamps (seconds) of every appearance
    pub appearance_timestamps: Vec<f64>,
}

impl Track {
    /// Create a new track from its first observation.
    pub fn new(
        track_id: impl Into<TrackId>,
        frame_index: u64,
        timestamp: f64,
        crop: Crop,
        detector_confidence: f32,
    ) -> Self {
        Self {
            track_id: track_id.into(),
            first_frame_index: frame_index,
            first_timestamp: timestamp,
            best_crop: crop,
            detector_confidence,
            appearance_frames: vec![frame_index],
            appearance_timestamps: vec![timestamp],
        }
    }

    /// Record an additional appearance of this track.
    ///
    /// Appearances arrive in source order, so the sequences stay strictly
    /// increasing.
    pub fn record_appearance(&mut self, frame_index: u64, timestamp: f64) {
        self.appearance_frames.push(frame_index);
        self.appearance_timestamps.push(timestamp);
    }

    /// Adopt a better crop if its quality exceeds the current best.
    ///
    /// Returns `true` when the crop was adopted.
    pub fn maybe_adopt_crop(&mut self, crop: Crop, detector_confidence: f32) -> bool {
        if crop.quality > self.best_crop.quality {
            self.best_crop = crop;
            self.detector_confidence = detector_confidence;
            true
        } else {
            false
        }
    }

    /// Number of recorded appearances.
    pub fn appearance_count(&self) -> usize {
        self.appearance_frames.len()
    }
}

/// Format a timestamp in seconds as `MM:SS` for display.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

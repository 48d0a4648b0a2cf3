//! Suspect matches from the clothing matcher.

use serde::{Deserialize, Serialize};

use crate::crop::Crop;
use crate::track::{Track, TrackId};

/// A single candidate returned by the matcher service for one query crop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetMatch {
    /// Registered target this crop resembles
    #[serde(rename = "suspect_id")]
    pub target_id: String,
    /// Clothing similarity in `[0, 1]`
    pub similarity: f64,
    /// Matcher-reported confidence in the similarity estimate
    #[serde(default)]
    pub confidence: f64,
}

/// A retained pairing of a track with a registered target.
///
/// Only the single best candidate at or above the retention threshold
/// survives per track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspectMatch {
    /// Track this match belongs to
    pub track_id: TrackId,
    /// Matched target
    pub target_id: String,
    /// Similarity of the best candidate
    pub similarity: f64,
    /// Matcher confidence
    pub confidence: f64,
    /// First appearance of the track (seconds)
    pub first_timestamp: f64,
    /// Detector confidence of the best crop
    pub detector_confidence: f32,
    /// Best crop of the matched track
    pub crop: Crop,
    /// Frame indices of every appearance of the track
    pub appearance_frames: Vec<u64>,
    /// Parallel timestamps of every appearance
    pub appearance_timestamps: Vec<f64>,
}

impl SuspectMatch {
    /// Build a retained match from a track and its best candidate.
    pub fn from_track(track: &Track, candidate: &TargetMatch) -> Self {
        Self {
            track_id: track.track_id.clone(),
            target_id: candidate.target_id.clone(),
            similarity: candidate.similarity,
            confidence: candidate.confidence,
            first_timestamp: track.first_timestamp,
            detector_confidence: track.detector_confidence,
            crop: track.best_crop.clone(),
            appearance_frames: track.appearance_frames.clone(),
            appearance_timestamps: track.appearance_timestamps.clone(),
        }
    }
}

//! Person track registry.
//!
//! Maintains the set of unique persons seen so far. Assignment is a cheap
//! spatial heuristic over best-crop bounding boxes; the expensive identity
//! work happens later in the clothing matcher. Owned by exactly one task,
//! so no locking.

use tracing::{debug, info};

use sleuth_models::{Crop, Track, TrackId};

use crate::config::PipelineConfig;

/// Result of observing one detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackObservation {
    /// A new track was created
    New(TrackId),
    /// The detection joined an existing track
    Existing(TrackId),
}

/// The per-analysis registry of unique persons.
pub struct TrackRegistry {
    tracks: Vec<Track>,
    next_id: u32,
    max_center_distance: f32,
    min_size_ratio: f32,
}

impl TrackRegistry {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 1,
            max_center_distance: config.track_max_center_distance,
            min_size_ratio: config.track_min_size_ratio,
        }
    }

    /// Fold one detection crop into the registry.
    ///
    /// The crop joins the first track (in insertion order) whose best-crop
    /// bbox center lies within `max_center_distance` pixels and whose area
    /// ratio exceeds `min_size_ratio`; otherwise a new track is created.
    pub fn observe(
        &mut self,
        frame_index: u64,
        timestamp: f64,
        crop: Crop,
        detector_confidence: f32,
    ) -> TrackObservation {
        for track in &mut self.tracks {
            let distance = crop.bbox.center_distance(&track.best_crop.bbox);
            let size_ratio = crop.bbox.size_ratio(&track.best_crop.bbox);

            if distance < self.max_center_distance && size_ratio > self.min_size_ratio {
                // Two detections in the same frame can land on one track;
                // the appearance sequences stay strictly increasing.
                if track.appearance_frames.last() != Some(&frame_index) {
                    track.record_appearance(frame_index, timestamp);
                }
                if track.maybe_adopt_crop(crop, detector_confidence) {
                    debug!(track = %track.track_id, "Track upgraded to a better crop");
                }
                return TrackObservation::Existing(track.track_id.clone());
            }
        }

        let track_id = format!("person_{:02}", self.next_id);
        self.next_id += 1;

        info!(
            track = %track_id,
            frame = frame_index,
            quality = crop.quality,
            "New person discovered"
        );

        self.tracks.push(Track::new(
            track_id.clone(),
            frame_index,
            timestamp,
            crop,
            detector_confidence,
        ));
        TrackObservation::New(track_id)
    }

    /// Number of tracks discovered so far.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Look up a track by ID.
    pub fn get(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.track_id == track_id)
    }

    /// Tracks in insertion order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Freeze the registry: tracks ordered by descending crop quality.
    pub fn into_tracks_by_quality(self) -> Vec<Track> {
        let mut tracks = self.tracks;
        tracks.sort_by(|a, b| {
            b.best_crop
                .quality
                .partial_cmp(&a.best_crop.quality)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        tracks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleuth_models::BBox;

    fn crop_at(x1: f32, y1: f32, x2: f32, y2: f32, quality: f32) -> Crop {
        Crop {
            image_base64: String::new(),
            bbox: BBox::new(x1, y1, x2, y2),
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
            quality,
        }
    }

    fn registry() -> TrackRegistry {
        TrackRegistry::new(&PipelineConfig::default())
    }

    #[test]
    fn test_first_detection_creates_track() {
        let mut reg = registry();
        let obs = reg.observe(0, 0.0, crop_at(100.0, 100.0, 200.0, 300.0, 0.8), 0.9);
        assert_eq!(obs, TrackObservation::New("person_01".to_string()));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_nearby_same_size_joins_track() {
        let mut reg = registry();
        reg.observe(0, 0.0, crop_at(100.0, 100.0, 200.0, 300.0, 0.8), 0.9);
        // Center moved 50 px right, same size: joins person_01.
        let obs = reg.observe(3, 3.0, crop_at(150.0, 100.0, 250.0, 300.0, 0.7), 0.85);
        assert_eq!(obs, TrackObservation::Existing("person_01".to_string()));
        assert_eq!(reg.len(), 1);

        let track = reg.get("person_01").unwrap();
        assert_eq!(track.appearance_frames, vec![0, 3]);
        assert_eq!(track.appearance_timestamps, vec![0.0, 3.0]);
        // Lower-quality crop did not replace the best one.
        assert_eq!(track.best_crop.quality, 0.8);
    }

    #[test]
    fn test_distant_detection_creates_new_track() {
        let mut reg = registry();
        reg.observe(0, 0.0, crop_at(100.0, 100.0, 200.0, 300.0, 0.8), 0.9);
        // Center 300 px away: new person.
        let obs = reg.observe(0, 0.0, crop_at(400.0, 100.0, 500.0, 300.0, 0.6), 0.8);
        assert_eq!(obs, TrackObservation::New("person_02".to_string()));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_size_mismatch_creates_new_track() {
        let mut reg = registry();
        reg.observe(0, 0.0, crop_at(100.0, 100.0, 200.0, 300.0, 0.8), 0.9);
        // Same center but half the linear size: area ratio 0.25 < 0.6.
        let obs = reg.observe(1, 1.0, crop_at(125.0, 150.0, 175.0, 250.0, 0.6), 0.8);
        assert_eq!(obs, TrackObservation::New("person_02".to_string()));
    }

    #[test]
    fn test_registry_iterates_in_insertion_order() {
        let mut reg = registry();
        reg.observe(0, 0.0, crop_at(100.0, 100.0, 200.0, 300.0, 0.8), 0.9);
        reg.observe(0, 0.0, crop_at(400.0, 100.0, 500.0, 300.0, 0.8), 0.9);
        // The probe sits between both tracks but within threshold of the
        // first; iteration order decides the assignment.
        let obs = reg.observe(2, 2.0, crop_at(110.0, 100.0, 210.0, 300.0, 0.5), 0.7);
        assert_eq!(obs, TrackObservation::Existing("person_01".to_string()));
    }

    #[test]
    fn test_better_crop_replaces_best() {
        let mut reg = registry();
        reg.observe(0, 0.0, crop_at(100.0, 100.0, 200.0, 300.0, 0.6), 0.5);
        reg.observe(2, 2.0, crop_at(110.0, 100.0, 210.0, 300.0, 0.9), 0.95);

        let track = reg.get("person_01").unwrap();
        assert_eq!(track.best_crop.quality, 0.9);
        assert_eq!(track.detector_confidence, 0.95);
    }

    #[test]
    fn test_same_frame_duplicate_keeps_sequences_strict() {
        let mut reg = registry();
        reg.observe(5, 5.0, crop_at(100.0, 100.0, 200.0, 300.0, 0.6), 0.5);
        // Second detection in the same frame landing on the same track.
        reg.observe(5, 5.0, crop_at(105.0, 100.0, 205.0, 300.0, 0.7), 0.6);

        let track = reg.get("person_01").unwrap();
        assert_eq!(track.appearance_frames, vec![5]);
        assert!(track.appearance_frames.len() == track.appearance_timestamps.len());
    }

    #[test]
    fn test_track_ids_are_zero_padded_and_monotonic() {
        let mut reg = registry();
        for i in 0..11 {
            reg.observe(
                i,
                i as f64,
                crop_at(1000.0 * i as f32, 100.0, 1000.0 * i as f32 + 100.0, 300.0, 0.5),
                0.5,
            );
        }
        let ids: Vec<_> = reg.tracks().iter().map(|t| t.track_id.clone()).collect();
        assert_eq!(ids[0], "person_01");
        assert_eq!(ids[9], "person_10");
        assert_eq!(ids[10], "person_11");
    }

    #[test]
    fn test_freeze_orders_by_quality() {
        let mut reg = registry();
        reg.observe(0, 0.0, crop_at(100.0, 100.0, 200.0, 300.0, 0.5), 0.9);
        reg.observe(0, 0.0, crop_at(500.0, 100.0, 600.0, 300.0, 0.9), 0.9);
        reg.observe(0, 0.0, crop_at(900.0, 100.0, 1000.0, 300.0, 0.7), 0.9);

        let frozen = reg.into_tracks_by_quality();
        let qualities: Vec<_> = frozen.iter().map(|t| t.best_crop.quality).collect();
        assert_eq!(qualities, vec![0.9, 0.7, 0.5]);
    }
}

//! Pipeline configuration.
//!
//! Every tuning constant of the pipeline lives here with an environment
//! override, defaulting to the values the heuristics were tuned with.

use std::time::Duration;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Frames per detection batch
    pub detection_batch_size: usize,
    /// Track crops per matching batch
    pub matching_batch_size: usize,
    /// Maximum wait from the first pending item before a partial batch flushes
    pub batch_timeout: Duration,
    /// Confidence threshold forwarded to the detector
    pub detection_confidence: f32,
    /// Minimum similarity for a match to be retained
    pub match_threshold: f64,
    /// Similarity at which a match counts as high-confidence
    pub high_confidence_threshold: f64,
    /// Quality floor below which a frame is skipped outright
    pub min_frame_quality: f32,
    /// Skip frames below this fraction of the recent-quality mean
    pub below_avg_factor: f32,
    /// Minimum quality to process once a high-confidence match was seen
    pub aggressive_min_quality: f32,
    /// Depth of the recent-quality ring
    pub quality_window: usize,
    /// Ring depth required before the below-average rule applies
    pub min_window_for_avg: usize,
    /// Consecutive skips that force the next frame through
    pub max_consecutive_skips: u32,
    /// Minimum person-crop width in pixels
    pub min_crop_width: u32,
    /// Minimum person-crop height in pixels
    pub min_crop_height: u32,
    /// Maximum bbox-center distance for two detections to share a track
    pub track_max_center_distance: f32,
    /// Minimum bbox-area ratio for two detections to share a track
    pub track_min_size_ratio: f32,
    /// Normal-mode stop: matches required once high confidence was seen
    pub normal_mode_min_matches: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detection_batch_size: 6,
            matching_batch_size: 3,
            batch_timeout: Duration::from_millis(800),
            detection_confidence: 0.25,
            match_threshold: 0.6,
            high_confidence_threshold: 0.95,
            min_frame_quality: 0.4,
            below_avg_factor: 0.7,
            aggressive_min_quality: 0.7,
            quality_window: 10,
            min_window_for_avg: 5,
            max_consecutive_skips: 3,
            min_crop_width: 50,
            min_crop_height: 100,
            track_max_center_distance: 150.0,
            track_min_size_ratio: 0.6,
            normal_mode_min_matches: 3,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            detection_batch_size: env_parse("PIPELINE_DETECTION_BATCH_SIZE")
                .unwrap_or(defaults.detection_batch_size),
            matching_batch_size: env_parse("PIPELINE_MATCHING_BATCH_SIZE")
                .unwrap_or(defaults.matching_batch_size),
            batch_timeout: Duration::from_millis(
                env_parse("PIPELINE_BATCH_TIMEOUT_MS").unwrap_or(800),
            ),
            detection_confidence: env_parse("PIPELINE_DETECTION_CONFIDENCE")
                .unwrap_or(defaults.detection_confidence),
            match_threshold: env_parse("PIPELINE_MATCH_THRESHOLD")
                .unwrap_or(defaults.match_threshold),
            high_confidence_threshold: env_parse("PIPELINE_HIGH_CONFIDENCE_THRESHOLD")
                .unwrap_or(defaults.high_confidence_threshold),
            min_frame_quality: env_parse("PIPELINE_MIN_FRAME_QUALITY")
                .unwrap_or(defaults.min_frame_quality),
            below_avg_factor: env_parse("PIPELINE_BELOW_AVG_FACTOR")
                .unwrap_or(defaults.below_avg_factor),
            aggressive_min_quality: env_parse("PIPELINE_AGGRESSIVE_MIN_QUALITY")
                .unwrap_or(defaults.aggressive_min_quality),
            quality_window: env_parse("PIPELINE_QUALITY_WINDOW").unwrap_or(defaults.quality_window),
            min_window_for_avg: env_parse("PIPELINE_MIN_WINDOW_FOR_AVG")
                .unwrap_or(defaults.min_window_for_avg),
            max_consecutive_skips: env_parse("PIPELINE_MAX_CONSECUTIVE_SKIPS")
                .unwrap_or(defaults.max_consecutive_skips),
            min_crop_width: env_parse("PIPELINE_MIN_CROP_WIDTH").unwrap_or(defaults.min_crop_width),
            min_crop_height: env_parse("PIPELINE_MIN_CROP_HEIGHT")
                .unwrap_or(defaults.min_crop_height),
            track_max_center_distance: env_parse("PIPELINE_TRACK_MAX_CENTER_DISTANCE")
                .unwrap_or(defaults.track_max_center_distance),
            track_min_size_ratio: env_parse("PIPELINE_TRACK_MIN_SIZE_RATIO")
                .unwrap_or(defaults.track_min_size_ratio),
            normal_mode_min_matches: env_parse("PIPELINE_NORMAL_MODE_MIN_MATCHES")
                .unwrap_or(defaults.normal_mode_min_matches),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

//! Pipeline statistics.

use serde::{Deserialize, Serialize};

/// Counters accumulated over one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Frames surviving decoder sub-sampling
    pub frames_sampled: u64,
    /// Sampled frames the quality gate sent downstream
    pub frames_processed: u64,
    /// Sampled frames the quality gate dropped
    pub frames_skipped: u64,
    /// `frames_skipped / frames_sampled`, in `[0, 1]`
    pub skip_rate: f64,
    /// Mean gate quality over all sampled frames
    pub avg_quality: f64,
    /// Unique tracks discovered
    pub tracks_found: u64,
    /// Retained suspect matches
    pub matches_found: u64,
    /// Whether a >= 0.95 similarity match was observed
    pub high_confidence_seen: bool,
}

impl PipelineStats {
    /// Recompute the derived skip rate from the raw counters.
    pub fn finalize(&mut self) {
        if self.frames_sampled > 0 {
            self.skip_rate = self.frames_skipped as f64 / self.frames_sampled as f64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_rate() {
        let mut stats = PipelineStats {
            frames_sampled: 10,
            frames_processed: 7,
            frames_skipped: 3,
            ..Default::default()
        };
        stats.finalize();
        assert!((stats.skip_rate - 0.3).abs() < 1e-9);
        assert_eq!(stats.frames_processed + stats.frames_skipped, stats.frames_sampled);
    }

    #[test]
    fn test_skip_rate_no_frames() {
        let mut stats = PipelineStats::default();
        stats.finalize();
        assert_eq!(stats.skip_rate, 0.0);
    }
}

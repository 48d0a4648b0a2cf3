//! Shared statistics collection across pipeline stages.

use std::sync::{Arc, Mutex};

use sleuth_models::PipelineStats;

#[derive(Debug, Default)]
struct Inner {
    frames_sampled: u64,
    frames_processed: u64,
    frames_skipped: u64,
    quality_sum: f64,
    tracks_found: u64,
    matches_found: u64,
}

/// Thread-safe counters updated by the gate, registry and matcher tasks.
#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    inner: Arc<Mutex<Inner>>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sampled frame and the gate's verdict on it.
    pub fn record_sampled(&self, quality: f32, processed: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.frames_sampled += 1;
        inner.quality_sum += quality as f64;
        if processed {
            inner.frames_processed += 1;
        } else {
            inner.frames_skipped += 1;
        }
    }

    pub fn set_tracks_found(&self, tracks: u64) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).tracks_found = tracks;
    }

    pub fn set_matches_found(&self, matches: u64) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).matches_found = matches;
    }

    /// Project the counters into a serializable snapshot.
    pub fn snapshot(&self, high_confidence_seen: bool) -> PipelineStats {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut stats = PipelineStats {
            frames_sampled: inner.frames_sampled,
            frames_processed: inner.frames_processed,
            frames_skipped: inner.frames_skipped,
            skip_rate: 0.0,
            avg_quality: if inner.frames_sampled > 0 {
                inner.quality_sum / inner.frames_sampled as f64
            } else {
                0.0
            },
            tracks_found: inner.tracks_found,
            matches_found: inner.matches_found,
            high_confidence_seen,
        };
        stats.finalize();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_balance() {
        let stats = StatsCollector::new();
        stats.record_sampled(0.8, true);
        stats.record_sampled(0.2, false);
        stats.record_sampled(0.6, true);

        let snapshot = stats.snapshot(false);
        assert_eq!(snapshot.frames_sampled, 3);
        assert_eq!(
            snapshot.frames_processed + snapshot.frames_skipped,
            snapshot.frames_sampled
        );
        assert!((snapshot.skip_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((snapshot.avg_quality - (0.8 + 0.2 + 0.6) / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_snapshot_carries_high_confidence() {
        let stats = StatsCollector::new();
        assert!(!stats.snapshot(false).high_confidence_seen);
        assert!(stats.snapshot(true).high_confidence_seen);
    }
}

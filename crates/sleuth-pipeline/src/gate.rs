//! Quality gate / skip controller.
//!
//! Stateful, single-task-per-analysis frame filter. The decision itself is
//! a pure function over `(quality, recent ring, skip streak, high-confidence
//! flag)` so the rule table can be tested exhaustively.

use std::collections::VecDeque;

use crate::config::PipelineConfig;
use crate::termination::TerminationCoordinator;

/// Why a frame was skipped (or `None` when processed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Processed normally
    None,
    /// Quality below the hard floor
    LowQuality,
    /// Quality well below the recent average
    BelowAvg,
    /// Skip streak bound reached, frame forced through
    MaxSkipOverride,
    /// High-confidence mode accepts only high-quality frames
    AggressiveSkip,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::LowQuality => "low_quality",
            Self::BelowAvg => "below_avg",
            Self::MaxSkipOverride => "max_skip_override",
            Self::AggressiveSkip => "aggressive_skip",
        }
    }
}

/// Outcome of gating one frame. Transient, never retained.
#[derive(Debug, Clone, Copy)]
pub struct QualityDecision {
    pub process: bool,
    pub quality: f32,
    pub reason: SkipReason,
}

/// The skip controller state for one analysis.
pub struct FrameGate {
    config: PipelineConfig,
    coordinator: TerminationCoordinator,
    ring: VecDeque<f32>,
    skip_count: u32,
}

impl FrameGate {
    pub fn new(config: PipelineConfig, coordinator: TerminationCoordinator) -> Self {
        let capacity = config.quality_window;
        Self {
            config,
            coordinator,
            ring: VecDeque::with_capacity(capacity),
            skip_count: 0,
        }
    }

    /// Gate one sampled frame given its quality score.
    pub fn decide(&mut self, quality: f32) -> QualityDecision {
        if self.ring.len() == self.config.quality_window {
            self.ring.pop_front();
        }
        self.ring.push_back(quality);

        let decision = decide(
            quality,
            &self.ring,
            self.skip_count,
            self.coordinator.high_confidence_seen(),
            &self.config,
        );

        if decision.process {
            self.skip_count = 0;
        } else {
            self.skip_count += 1;
        }

        decision
    }

    /// Current consecutive-skip streak.
    pub fn skip_count(&self) -> u32 {
        self.skip_count
    }
}

/// The decision table; first matching rule wins.
fn decide(
    quality: f32,
    ring: &VecDeque<f32>,
    skip_count: u32,
    high_confidence: bool,
    config: &PipelineConfig,
) -> QualityDecision {
    if high_confidence && quality < config.aggressive_min_quality {
        return skip(quality, SkipReason::AggressiveSkip);
    }
    if skip_count >= config.max_consecutive_skips {
        return process(quality, SkipReason::MaxSkipOverride);
    }
    if quality < config.min_frame_quality {
        return skip(quality, SkipReason::LowQuality);
    }
    if ring.len() >= config.min_window_for_avg {
        let mean = ring.iter().sum::<f32>() / ring.len() as f32;
        if quality < config.below_avg_factor * mean {
            return skip(quality, SkipReason::BelowAvg);
        }
    }
    process(quality, SkipReason::None)
}

fn process(quality: f32, reason: SkipReason) -> QualityDecision {
    QualityDecision {
        process: true,
        quality,
        reason,
    }
}

fn skip(quality: f32, reason: SkipReason) -> QualityDecision {
    QualityDecision {
        process: false,
        quality,
        reason,
    }
}

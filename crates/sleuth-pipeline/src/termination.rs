//! Termination coordination.
//!
//! Two one-way flags shared across all stages of one analysis:
//! `high_confidence` flips when the matcher observes a >= 0.95 similarity
//! and makes the quality gate aggressive; `cancelled` flips in realtime
//! mode and stops every stage at its next suspension point. Release/Acquire
//! ordering guarantees a reader sees the transition once it happened.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Flags {
    high_confidence: AtomicBool,
    cancelled: AtomicBool,
}

/// Shared termination state for one analysis.
#[derive(Debug, Clone, Default)]
pub struct TerminationCoordinator {
    flags: Arc<Flags>,
}

impl TerminationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a high-confidence match was observed. One-way.
    pub fn set_high_confidence(&self) {
        self.flags.high_confidence.store(true, Ordering::Release);
    }

    pub fn high_confidence_seen(&self) -> bool {
        self.flags.high_confidence.load(Ordering::Acquire)
    }

    /// Request pipeline cancellation. One-way.
    pub fn cancel(&self) {
        self.flags.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flags.cancelled.load(Ordering::Acquire)
    }
}

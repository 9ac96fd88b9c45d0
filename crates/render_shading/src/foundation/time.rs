//! Time management utilities

use std::time::Duration;

/// Snapshot of frame timing handed to per-frame updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeInterval {
    /// Time elapsed since the start of the game
    pub total_time: Duration,
    /// Time elapsed since the previous frame
    pub delta_time: Duration,
}

impl TimeInterval {
    /// Create a new interval
    pub fn new(total_time: Duration, delta_time: Duration) -> Self {
        Self { total_time, delta_time }
    }

    /// Delta time in milliseconds
    pub fn delta_millis(&self) -> f32 {
        self.delta_time.as_secs_f32() * 1000.0
    }

    /// Advance by `delta`, returning the next frame's interval
    pub fn advance(&self, delta: Duration) -> Self {
        Self::new(self.total_time + delta, delta)
    }
}

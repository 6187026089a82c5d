//! Forward-progress bookkeeping.

use core_async::time::{Duration, Instant};

/// Remembers the last playback position that counted as progress and when
/// it was observed.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    epsilon: f64,
    last_position: f64,
    last_progress_at: Instant,
}

impl ProgressTracker {
    pub fn new(epsilon: f64, now: Instant) -> Self {
        Self {
            epsilon,
            last_position: 0.0,
            last_progress_at: now,
        }
    }

    /// Start over for a freshly created session: position zero, observed
    /// `now`.
    pub fn reset(&mut self, now: Instant) {
        self.last_position = 0.0;
        self.last_progress_at = now;
    }

    /// Record a position report. Returns `true` when the position moved
    /// forward by more than the epsilon, which refreshes the progress
    /// instant.
    ///
    /// A position that jumps backwards (a timeline discontinuity in the feed)
    /// rebases the baseline without counting as progress.
    pub fn record_progress(&mut self, position: f64, now: Instant) -> bool {
        if !position.is_finite() {
            return false;
        }

        if position > self.last_position + self.epsilon {
            self.last_position = position;
            self.last_progress_at = now;
            return true;
        }

        if position < self.last_position - self.epsilon {
            self.last_position = position;
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn last_position(&self) -> f64 {
        self.last_position
    }

    #[cfg(test)]
    pub(crate) fn last_progress_at(&self) -> Instant {
        self.last_progress_at
    }

    pub fn time_since_progress(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_progress_at)
    }
}

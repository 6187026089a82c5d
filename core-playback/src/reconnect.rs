//! # Reconnect Scheduler
//!
//! Backoff and retry-budget bookkeeping for one attach cycle.
//!
//! The scheduler decides *whether* and *when* to reconnect; arming the timer
//! and rebuilding the session is the controller's job. Every failure signal
//! from every source goes through [`ReconnectScheduler::on_failure`], which
//! collapses bursts into a single pending reconnect.
//!
//! ## Delay sequence
//!
//! With the defaults (1 s initial, 30 s cap, 250 ms jitter, budget 5) the
//! n-th consecutive attempt waits `min(30 s, 1 s * 2^(n-1))` plus jitter:
//!
//! ```text
//! attempt:  1     2     3     4      5
//! delay:    1s    2s    4s    8s     16s   (+ 0..250ms)
//! ```
//!
//! A sixth failure without intervening progress schedules nothing.

use crate::config::ResilienceConfig;
use core_async::time::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Why a feed was reported broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The decoder session reported an internal error.
    DecodeError(String),
    /// The sink reported a decode or render error.
    PlaybackError(String),
    /// The sink is fetching but no data arrives.
    Stalled,
    /// The sink is waiting for the next frame.
    Waiting,
    /// The watchdog saw no progress for too long.
    StallWatchdog,
    /// The session was created but refused to load or play.
    LoadFailed(String),
    /// The decoder backend could not create a session.
    SessionCreateFailed(String),
}

impl FailureReason {
    /// Short machine-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::DecodeError(_) => "decode_error",
            FailureReason::PlaybackError(_) => "playback_error",
            FailureReason::Stalled => "stalled",
            FailureReason::Waiting => "waiting",
            FailureReason::StallWatchdog => "stall_watchdog",
            FailureReason::LoadFailed(_) => "load_failed",
            FailureReason::SessionCreateFailed(_) => "session_create_failed",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            FailureReason::DecodeError(detail)
            | FailureReason::PlaybackError(detail)
            | FailureReason::LoadFailed(detail)
            | FailureReason::SessionCreateFailed(detail) => Some(detail),
            FailureReason::Stalled | FailureReason::Waiting | FailureReason::StallWatchdog => None,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{}: {}", self.as_str(), detail),
            None => f.write_str(self.as_str()),
        }
    }
}

/// What a failure signal resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// A reconnect should be armed to fire after `delay`. `attempt` is the
    /// 1-based number of consecutive attempts including this one.
    Scheduled { attempt: u32, delay: Duration },
    /// A reconnect is already armed; this signal is absorbed by it.
    AlreadyPending,
    /// The retry budget is spent. `first_report` is set only for the first
    /// signal after exhaustion so callers can log it once.
    BudgetExhausted { attempts: u32, first_report: bool },
}

#[derive(Debug)]
pub struct ReconnectScheduler {
    initial_backoff: Duration,
    max_backoff: Duration,
    jitter_ceiling: Duration,
    retry_budget: u32,
    attempts: u32,
    pending: bool,
    exhaustion_reported: bool,
    rng: StdRng,
}

impl ReconnectScheduler {
    pub fn new(config: &ResilienceConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic jitter, for reproducible runs.
    pub fn with_seed(config: &ResilienceConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &ResilienceConfig, rng: StdRng) -> Self {
        Self {
            initial_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            jitter_ceiling: config.jitter_ceiling,
            retry_budget: config.retry_budget,
            attempts: 0,
            pending: false,
            exhaustion_reported: false,
            rng,
        }
    }

    /// Register a failure signal.
    ///
    /// While a reconnect is pending every signal collapses into it, even when
    /// that reconnect is the last one the budget allows. Exhaustion is only
    /// reported once nothing is in flight.
    pub fn on_failure(&mut self, _reason: &FailureReason) -> FailureOutcome {
        if self.pending {
            return FailureOutcome::AlreadyPending;
        }

        if self.attempts >= self.retry_budget {
            let first_report = !self.exhaustion_reported;
            self.exhaustion_reported = true;
            return FailureOutcome::BudgetExhausted {
                attempts: self.attempts,
                first_report,
            };
        }

        let delay = self.backoff_delay(self.attempts) + self.jitter();
        self.attempts += 1;
        self.pending = true;

        FailureOutcome::Scheduled {
            attempt: self.attempts,
            delay,
        }
    }

    /// Exponential part of the delay for an attempt counter value of
    /// `attempts` (0 for the first reconnect), capped at the maximum.
    pub fn backoff_delay(&self, attempts: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempts);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    fn jitter(&mut self) -> Duration {
        let ceiling = self.jitter_ceiling.as_nanos().min(u64::MAX as u128) as u64;
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.rng.gen_range(0..ceiling))
    }

    /// The armed timer fired. Returns `false` if nothing was pending, in
    /// which case the caller must not reconnect.
    pub fn fire(&mut self) -> bool {
        std::mem::replace(&mut self.pending, false)
    }

    /// Forget the armed timer without reconnecting.
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    /// Playback advanced: the next failure starts again from the initial
    /// delay. Returns the attempt count that was discarded.
    pub fn reset_attempts(&mut self) -> u32 {
        self.exhaustion_reported = false;
        std::mem::take(&mut self.attempts)
    }

    #[cfg(test)]
    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        self.pending
    }

    #[cfg(test)]
    pub(crate) fn is_exhausted(&self) -> bool {
        self.attempts >= self.retry_budget
    }
}

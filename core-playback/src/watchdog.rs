//! # Stall Watchdog
//!
//! Periodic sampler that catches feeds which stop advancing without the sink
//! ever reporting a problem.
//!
//! The watchdog owns only the ticker task. Each tick invokes a callback,
//! which in the controller posts a message back to the actor; the stall
//! decision itself is [`StallWatchdog::is_stalled`], a pure check against
//! the [`ProgressTracker`].

use crate::progress::ProgressTracker;
use core_async::task::{self, AbortOnDrop};
use core_async::time::{self, Duration, Instant};
use tracing::trace;

pub struct StallWatchdog {
    interval: Duration,
    threshold: Duration,
    ticker: Option<AbortOnDrop<()>>,
}

impl StallWatchdog {
    pub fn new(interval: Duration, threshold: Duration) -> Self {
        Self {
            interval,
            threshold,
            ticker: None,
        }
    }

    /// Start ticking. The first tick fires one interval from now. `on_tick`
    /// returns `false` to stop the ticker, e.g. once its receiver is gone.
    ///
    /// Starting a running watchdog restarts it.
    pub fn start<F>(&mut self, on_tick: F)
    where
        F: Fn() -> bool + Send + 'static,
    {
        self.stop();

        let period = self.interval;
        let handle = task::spawn(async move {
            let mut ticker = time::delayed_interval(period);
            loop {
                ticker.tick().await;
                if !on_tick() {
                    trace!("watchdog receiver gone, ticker exiting");
                    break;
                }
            }
        });
        self.ticker = Some(AbortOnDrop::new(handle));
    }

    /// Stop ticking. No tick is delivered after this returns.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.ticker
            .as_ref()
            .map_or(false, |ticker| !ticker.is_finished())
    }

    /// A sink counts as stalled when it is not paused by the user and has
    /// made no forward progress for longer than the threshold.
    pub fn is_stalled(&self, sink_paused: bool, tracker: &ProgressTracker, now: Instant) -> bool {
        !sink_paused && tracker.time_since_progress(now) > self.threshold
    }
}

impl Drop for StallWatchdog {
    fn drop(&mut self) {
        self.stop();
    }
}

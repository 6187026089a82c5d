//! Time-related abstractions.
//!
//! `Instant` is Tokio's instant rather than `std::time::Instant`: it follows
//! the runtime clock, so a runtime started with a paused clock (see
//! [`crate::runtime::block_on_paused`]) observes exactly the time advanced by
//! pending timers. Watchdogs and backoff timers measure elapsed time with it.
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{sleep, Duration, Instant};
//!
//! async fn example() {
//!     let start = Instant::now();
//!     sleep(Duration::from_millis(5)).await;
//!     assert!(start.elapsed() >= Duration::from_millis(5));
//! }
//! ```

pub use tokio::time::{
    interval, interval_at, sleep, sleep_until, timeout, Instant, Interval, MissedTickBehavior,
    Sleep, Timeout,
};

pub use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Creates an interval whose first tick fires one `period` from now.
///
/// Tokio's [`interval`] yields immediately on the first `tick()`; periodic
/// checks that must not run at time zero use this instead. Missed ticks are
/// delayed rather than burst.
///
/// # Examples
///
/// ```rust
/// use core_async::time::{delayed_interval, Duration};
///
/// # async fn example() {
/// let mut ticker = delayed_interval(Duration::from_secs(1));
/// ticker.tick().await; // ~1s later
/// # }
/// ```
pub fn delayed_interval(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Returns the current wall-clock time as milliseconds since UNIX_EPOCH.
///
/// Falls back to zero if the system clock reports a time before the epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

//! # Resilience Configuration
//!
//! Tuning knobs for stall detection and reconnect backoff.
//!
//! Durations are expressed in milliseconds in serialized form so the
//! configuration can live next to the rest of a host's JSON settings:
//!
//! ```json
//! { "initial_backoff_ms": 1000, "max_backoff_ms": 30000, "retry_budget": 5 }
//! ```

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resilience controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// How often the stall watchdog samples playback.
    ///
    /// Default: 1 second.
    #[serde(
        rename = "watchdog_interval_ms",
        default = "default_watchdog_interval",
        with = "millis"
    )]
    pub watchdog_interval: Duration,

    /// Time without forward progress after which an unpaused sink counts as
    /// stalled.
    ///
    /// Default: 5 seconds.
    #[serde(
        rename = "stall_threshold_ms",
        default = "default_stall_threshold",
        with = "millis"
    )]
    pub stall_threshold: Duration,

    /// Minimum position advance that counts as progress, in sink time units.
    ///
    /// Default: 0.1.
    #[serde(default = "default_progress_epsilon")]
    pub progress_epsilon: f64,

    /// Delay before the first reconnect attempt.
    ///
    /// Default: 1 second.
    #[serde(
        rename = "initial_backoff_ms",
        default = "default_initial_backoff",
        with = "millis"
    )]
    pub initial_backoff: Duration,

    /// Upper bound on the exponential part of the delay.
    ///
    /// Default: 30 seconds.
    #[serde(
        rename = "max_backoff_ms",
        default = "default_max_backoff",
        with = "millis"
    )]
    pub max_backoff: Duration,

    /// Exclusive upper bound of the random jitter added to every delay.
    /// Zero disables jitter.
    ///
    /// Default: 250 ms.
    #[serde(
        rename = "jitter_ceiling_ms",
        default = "default_jitter_ceiling",
        with = "millis"
    )]
    pub jitter_ceiling: Duration,

    /// Consecutive reconnects allowed without observed progress.
    ///
    /// Default: 5.
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            watchdog_interval: default_watchdog_interval(),
            stall_threshold: default_stall_threshold(),
            progress_epsilon: default_progress_epsilon(),
            initial_backoff: default_initial_backoff(),
            max_backoff: default_max_backoff(),
            jitter_ceiling: default_jitter_ceiling(),
            retry_budget: default_retry_budget(),
        }
    }
}

impl ResilienceConfig {
    /// Faster detection and shorter delays, for channels where a few seconds
    /// of frozen picture matter more than reconnect churn.
    pub fn low_latency() -> Self {
        Self {
            watchdog_interval: Duration::from_millis(500),
            stall_threshold: Duration::from_secs(3),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            jitter_ceiling: Duration::from_millis(100),
            retry_budget: 8,
            ..Default::default()
        }
    }

    /// Tolerant of slow upstreams: waits longer before declaring a stall and
    /// spaces reconnects further apart.
    pub fn patient() -> Self {
        Self {
            stall_threshold: Duration::from_secs(10),
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(60),
            jitter_ceiling: Duration::from_millis(500),
            retry_budget: 10,
            ..Default::default()
        }
    }

    /// Parse a JSON document and validate the result. Missing fields take
    /// their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.watchdog_interval.is_zero() {
            return Err(invalid("watchdog_interval must be > 0"));
        }

        if self.stall_threshold <= self.watchdog_interval {
            return Err(invalid("stall_threshold must exceed watchdog_interval"));
        }

        if !self.progress_epsilon.is_finite() || self.progress_epsilon < 0.0 {
            return Err(invalid("progress_epsilon must be a finite, non-negative number"));
        }

        if self.initial_backoff.is_zero() {
            return Err(invalid("initial_backoff must be > 0"));
        }

        if self.max_backoff < self.initial_backoff {
            return Err(invalid("max_backoff cannot be shorter than initial_backoff"));
        }

        if self.retry_budget == 0 {
            return Err(invalid("retry_budget must be >= 1"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> PlaybackError {
    PlaybackError::InvalidConfig(message.to_string())
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_watchdog_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_stall_threshold() -> Duration {
    Duration::from_secs(5)
}

fn default_progress_epsilon() -> f64 {
    0.1
}

fn default_initial_backoff() -> Duration {
    Duration::from_millis(1000)
}

fn default_max_backoff() -> Duration {
    Duration::from_millis(30_000)
}

fn default_jitter_ceiling() -> Duration {
    Duration::from_millis(250)
}

fn default_retry_budget() -> u32 {
    5
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

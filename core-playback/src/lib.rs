//! # Live Playback Resilience
//!
//! Keeps a live transport-stream feed playing in front of an unreliable
//! upstream.
//!
//! ## Overview
//!
//! This crate handles:
//! - Forward-progress tracking against the sink's reported position
//! - A periodic stall watchdog for feeds that freeze silently
//! - Exponential-backoff reconnects with jitter and a retry budget
//! - Decoder session lifecycle with error-tolerant teardown
//!
//! Decoding and rendering are host capabilities, injected through the
//! [`bridge_traits::DecoderBackend`] and [`bridge_traits::RenderingSink`]
//! traits. [`ResilienceController`] ties the pieces together.

pub mod config;
pub mod controller;
pub mod error;
pub mod progress;
pub mod reconnect;
pub mod session;
pub mod target;
pub mod watchdog;

pub use config::ResilienceConfig;
pub use controller::{ResilienceController, ResilienceControllerBuilder};
pub use error::{PlaybackError, Result};
pub use progress::ProgressTracker;
pub use reconnect::{FailureOutcome, FailureReason, ReconnectScheduler};
pub use session::{CreateOutcome, SessionManager};
pub use target::StreamTarget;
pub use watchdog::StallWatchdog;

//! # Host Bridge Traits
//!
//! Capabilities the player core needs from its host but cannot provide itself.
//!
//! ## Traits
//!
//! ### Media
//! - [`RenderingSink`](playback::RenderingSink) - Output surface reporting progress and buffering
//! - [`DecoderBackend`](playback::DecoderBackend) - Factory for live transport-stream sessions
//! - [`DecoderSession`](playback::DecoderSession) - One decoder bound to one sink and one feed
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing at construction time:
//!
//! ```ignore
//! use core_playback::{PlaybackError, ResilienceController};
//!
//! let controller = ResilienceController::builder()
//!     .rendering_sink(sink)
//!     .build(); // Err(PlaybackError::CapabilityMissing { capability: "DecoderBackend", .. })
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should report a missing decoder with `BridgeError::NotAvailable` so the
//! core can tell "this runtime cannot play live feeds" apart from a feed that
//! failed to start.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`; the core drives them from a Tokio
//! task.

pub mod error;
pub mod logging;
pub mod playback;

pub use error::BridgeError;

pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use playback::{
    AudioSettings, DecoderBackend, DecoderSession, RenderingSink, SessionErrorCallback,
    SinkEvent,
};

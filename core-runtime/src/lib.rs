//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the player crates:
//! - Logging and tracing setup, with host log forwarding
//! - Credential-safe formatting of feed URLs
//! - The diagnostic event bus
//!
//! ## Overview
//!
//! Nothing in here knows about decoders or sinks. `core-playback` emits
//! [`events::PlaybackEvent`]s and logs through `tracing`; hosts decide where
//! both end up.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};

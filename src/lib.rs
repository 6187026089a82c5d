//! Player facade crate.
//!
//! Re-exports the workspace crates behind feature flags so host applications
//! can depend on `sparrow-player` alone:
//!
//! - `playback` (default): the resilience controller, its configuration and
//!   the runtime support it needs (logging setup, diagnostic events).
//!
//! The host capability traits in [`bridge`] are always available, since a
//! host has to implement them regardless of which features it enables.

pub use bridge_traits as bridge;

#[cfg(feature = "playback")]
pub use core_playback as playback;

#[cfg(feature = "playback")]
pub use core_runtime as runtime;

#[cfg(feature = "playback")]
pub use core_playback::{
    PlaybackError, ResilienceConfig, ResilienceController, ResilienceControllerBuilder,
    StreamTarget,
};

//! Playback bridge traits for live feeds.
//!
//! The player core never decodes or renders anything itself. The host hands
//! it two capabilities:
//!
//! - a [`RenderingSink`]: the media output surface (a video element, a native
//!   surface) that reports progress and buffering conditions, and
//! - a [`DecoderBackend`]: the transport-stream decoder library that creates
//!   [`DecoderSession`]s bound to that sink.
//!
//! Sink events are delivered over a broadcast channel so several observers
//! (the resilience controller, UI overlays) can listen independently.

use crate::error::Result;
use async_trait::async_trait;
use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Event raised by the rendering sink.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// Playback position advanced (or was re-reported) to `position`,
    /// expressed in the sink's media time units.
    Progress { position: f64 },
    /// The sink is trying to fetch data but none is arriving.
    Stalled,
    /// Playback halted because the next frame is not yet available.
    Waiting,
    /// The sink failed to decode or render media.
    Error { detail: String },
}

/// Volume and mute state of the sink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Linear volume in `[0.0, 1.0]`.
    pub volume: f32,
    pub muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            muted: false,
        }
    }
}

impl AudioSettings {
    /// Clamp the volume into the valid range. NaN becomes silence.
    pub fn clamped(self) -> Self {
        let volume = if self.volume.is_nan() {
            0.0
        } else {
            self.volume.clamp(0.0, 1.0)
        };
        Self { volume, ..self }
    }
}

/// Platform media-output surface a decoder session writes frames to.
///
/// Play/pause/volume/fullscreen controls are host concerns; the core only
/// reads the paused flag and carries volume/mute across session rebuilds.
pub trait RenderingSink: Send + Sync {
    /// `true` when the user has paused playback.
    fn is_paused(&self) -> bool;

    /// Current volume/mute state.
    fn audio_settings(&self) -> AudioSettings;

    /// Restore volume/mute, typically after a new session was bound.
    fn apply_audio_settings(&self, settings: AudioSettings);

    /// Subscribe to sink events. Each call returns an independent receiver.
    fn subscribe(&self) -> broadcast::Receiver<SinkEvent>;
}

/// Callback invoked by a session when its internal pipeline fails.
pub type SessionErrorCallback = Box<dyn Fn(String) + Send + Sync>;

/// A live decoding session bound to one sink and one stream address.
///
/// Sessions are created by [`DecoderBackend::create_session`], destroyed once,
/// and never reused afterwards.
#[async_trait]
pub trait DecoderSession: Send + Sync {
    /// Attach the session's output to `sink`.
    fn bind_sink(&mut self, sink: Arc<dyn RenderingSink>) -> Result<()>;

    /// Register the channel for internal decoder errors. Replaces any
    /// previously registered callback.
    fn on_error(&mut self, callback: SessionErrorCallback);

    /// Start fetching the stream.
    async fn load(&mut self) -> Result<()>;

    /// Start rendering.
    async fn play(&mut self) -> Result<()>;

    /// Release every resource held by the session.
    async fn destroy(&mut self) -> Result<()>;
}

/// Factory for decoder sessions.
#[async_trait]
pub trait DecoderBackend: Send + Sync {
    /// Whether the runtime can play live low-latency transport streams at all.
    fn supports_live_low_latency_playback(&self) -> bool;

    /// Create a session for the stream at `url`.
    ///
    /// Returns [`BridgeError::NotAvailable`](crate::BridgeError::NotAvailable)
    /// when the decoder cannot be instantiated in this environment.
    async fn create_session(&self, url: &str) -> Result<Box<dyn DecoderSession>>;
}

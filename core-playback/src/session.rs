//! # Session Lifecycle
//!
//! Owns the single active decoder session and its teardown.
//!
//! - At most one session exists at a time; `create` destroys a leftover one
//!   before building a new one.
//! - `destroy` never fails. Whatever the decoder reports while tearing down
//!   is logged and dropped, and the session handle is released regardless.
//! - Every session gets a fresh generation number. Error callbacks are tagged
//!   with it so reports from a session that was already replaced can be told
//!   apart from reports about the current one.

use crate::error::Result;
use crate::target::StreamTarget;
use bridge_traits::{AudioSettings, BridgeError, DecoderBackend, DecoderSession, RenderingSink};
use std::sync::Arc;
use tracing::{debug, info, warn};

struct ActiveSession {
    generation: u64,
    session: Box<dyn DecoderSession>,
}

/// Result of [`SessionManager::create`].
#[derive(Debug)]
pub enum CreateOutcome {
    /// A session is bound to the sink.
    Created { generation: u64 },
    /// The runtime cannot play live feeds at all. Retrying is pointless.
    Unavailable { detail: String },
    /// Session creation failed in a way that may be transient.
    Failed(BridgeError),
}

pub struct SessionManager {
    backend: Arc<dyn DecoderBackend>,
    sink: Arc<dyn RenderingSink>,
    active: Option<ActiveSession>,
    next_generation: u64,
    saved_audio: Option<AudioSettings>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn DecoderBackend>, sink: Arc<dyn RenderingSink>) -> Self {
        Self {
            backend,
            sink,
            active: None,
            next_generation: 1,
            saved_audio: None,
        }
    }

    pub fn has_session(&self) -> bool {
        self.active.is_some()
    }

    /// Generation of the live session, if any.
    pub fn current_generation(&self) -> Option<u64> {
        self.active.as_ref().map(|active| active.generation)
    }

    /// Volume/mute captured from the sink by the last teardown.
    #[cfg(test)]
    pub(crate) fn saved_audio(&self) -> Option<AudioSettings> {
        self.saved_audio
    }

    /// Tear down the active session. A no-op when there is none.
    ///
    /// Returns the generation of the destroyed session.
    pub async fn destroy(&mut self) -> Option<u64> {
        let mut active = self.active.take()?;
        self.saved_audio = Some(self.sink.audio_settings());

        if let Err(err) = active.session.destroy().await {
            warn!(
                generation = active.generation,
                error = %err,
                "decoder session reported an error during teardown; ignoring"
            );
        }
        debug!(generation = active.generation, "decoder session destroyed");
        Some(active.generation)
    }

    /// Build a session for `target` and bind it to the sink.
    ///
    /// `on_error` receives the session's generation alongside every error it
    /// reports.
    pub async fn create<F>(&mut self, target: &StreamTarget, on_error: F) -> CreateOutcome
    where
        F: Fn(u64, String) + Send + Sync + 'static,
    {
        if self.active.is_some() {
            warn!("creating a session while another is active; destroying the old one");
            self.destroy().await;
        }

        if !self.backend.supports_live_low_latency_playback() {
            return CreateOutcome::Unavailable {
                detail: "live low-latency playback is not supported by this runtime".to_string(),
            };
        }

        let mut session = match self.backend.create_session(target.as_str()).await {
            Ok(session) => session,
            Err(BridgeError::NotAvailable(detail)) => return CreateOutcome::Unavailable { detail },
            Err(err) => return CreateOutcome::Failed(err),
        };

        if let Err(err) = session.bind_sink(self.sink.clone()) {
            if let Err(destroy_err) = session.destroy().await {
                debug!(error = %destroy_err, "unbound session failed to destroy");
            }
            return CreateOutcome::Failed(err);
        }

        if let Some(settings) = self.saved_audio {
            self.sink.apply_audio_settings(settings.clamped());
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        session.on_error(Box::new(move |detail| on_error(generation, detail)));

        info!(stream = %target, generation, "decoder session created");
        self.active = Some(ActiveSession {
            generation,
            session,
        });
        CreateOutcome::Created { generation }
    }

    /// Load the stream and start rendering on the active session.
    pub async fn start_playback(&mut self) -> Result<()> {
        let Some(active) = self.active.as_mut() else {
            return Err(BridgeError::SinkDetached("no active decoder session".to_string()).into());
        };
        active.session.load().await?;
        active.session.play().await?;
        Ok(())
    }
}

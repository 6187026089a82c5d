//! # Playback Error Types
//!
//! Errors surfaced by the player core's public operations. Feed faults
//! (decode errors, stalls, teardown failures) are handled internally and
//! never reach the caller; what remains here is misuse and misconfiguration.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Stream address is empty or malformed.
    #[error("Invalid stream target: {0}")]
    InvalidTarget(String),

    /// Resilience configuration failed validation.
    #[error("Invalid resilience configuration: {0}")]
    InvalidConfig(String),

    /// A required host capability was not supplied.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// The controller task has stopped and accepts no more commands.
    #[error("Resilience controller is no longer running")]
    ControllerClosed,

    /// A bridge call failed.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Malformed configuration document.
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl PlaybackError {
    /// Returns `true` if retrying the same operation later may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            PlaybackError::Bridge(err) => !err.is_not_available(),
            _ => false,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

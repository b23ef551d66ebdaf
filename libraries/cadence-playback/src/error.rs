//! Error types for playback management

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure kinds reported to observers of the controller
///
/// Intents never return errors. When one cannot be carried out the controller
/// publishes one of these through [`crate::ControllerEvent::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlaybackError {
    /// The engine failed in a way not tied to a specific intent
    #[error("Unexpected playback failure")]
    Unexpected,

    /// Nothing could be played, or the engine refused to start
    #[error("Playback failed to start")]
    PlayFailed,

    /// Pause requested while nothing is bound but the engine reports playing
    #[error("Playback failed to pause")]
    PauseFailed,

    /// No track precedes the current one
    #[error("Cannot skip to the previous track")]
    SkipPreviousFailed,

    /// No track follows the current one
    #[error("Cannot skip to the next track")]
    SkipNextFailed,
}

/// Errors raised by an audio engine session
#[derive(Debug, Error)]
pub enum EngineError {
    /// The session was asked to do something its current state does not allow
    #[error("Invalid engine state: {0}")]
    InvalidState(String),

    /// The audio source could not be opened or prepared
    #[error("Failed to load audio source: {0}")]
    Load(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

//! Controller Events
//!
//! Notifications broadcast to every subscriber of a
//! [`PlaybackController`](crate::PlaybackController). Events are emitted when:
//! - an intent could not be carried out
//! - the bound track changed because of an engine or system event rather
//!   than a user intent (completion, focus loss, failed preparation)
//! - playback resumed after a transient focus loss

use cadence_core::Track;
use serde::{Deserialize, Serialize};

use crate::error::PlaybackError;

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControllerEvent {
    /// Something went wrong; reported once per failure
    Error(PlaybackError),

    /// The bound track changed without a user intent
    ///
    /// `None` means playback stopped and nothing is bound.
    TrackAutoAdvanced(Option<Track>),
}

impl ControllerEvent {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

//! Audio focus arbitration
//!
//! Only one application may produce audio at a time. The controller requests
//! focus before it loads or resumes a track and reacts to focus changes the
//! platform delivers later.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::WeakUnboundedSender;

use crate::controller::Message;

/// Kind of focus requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusRequest {
    /// Other audio must stop or pause
    #[default]
    Exclusive,

    /// Other audio may keep playing at reduced volume
    MayDuck,
}

/// Focus change delivered by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusChange {
    /// Focus regained after a transient loss
    Gain,

    /// Focus lost for an unbounded time
    Loss,

    /// Focus lost briefly (e.g. an incoming call)
    LossTransient,

    /// Focus lost briefly; ducking would be acceptable
    LossTransientCanDuck,
}

/// Platform audio focus service
pub trait AudioFocus: Send + Sync {
    /// Request focus; `listener` receives every later change for this grant
    ///
    /// Returns `true` when focus was granted.
    fn request(&self, kind: FocusRequest, listener: FocusEvents) -> bool;

    /// Give up any focus held
    fn abandon(&self);
}

/// Listener handle passed with each focus request
#[derive(Debug, Clone)]
pub struct FocusEvents {
    tx: WeakUnboundedSender<Message>,
}

impl FocusEvents {
    pub(crate) fn new(tx: WeakUnboundedSender<Message>) -> Self {
        Self { tx }
    }

    /// Deliver a focus change to the controller
    pub fn notify(&self, change: FocusChange) {
        if let Some(tx) = self.tx.upgrade() {
            let _ = tx.send(Message::Focus(change));
        }
    }
}

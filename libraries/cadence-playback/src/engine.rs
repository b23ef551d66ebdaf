//! Audio engine abstraction
//!
//! The controller never decodes audio itself. Platforms provide an
//! [`AudioEngine`] that opens one [`EngineSession`] per track; the session
//! reports readiness, completion and failure asynchronously through the
//! [`SessionEvents`] handle it was created with.

use std::sync::Arc;

use cadence_core::Track;
use tokio::sync::mpsc::WeakUnboundedSender;

use crate::controller::Message;
use crate::error::{EngineError, Result};

/// Factory for playback sessions
pub trait AudioEngine: Send + Sync {
    /// Open a session for `track`
    ///
    /// The session must not start producing audio until
    /// [`EngineSession::prepare_async`] has completed and
    /// [`EngineSession::start`] is called.
    fn create_session(&self, track: &Track, events: SessionEvents)
        -> Result<Arc<dyn EngineSession>>;
}

/// One decode/playback session bound to a single track
///
/// Implementations are called from the controller task and from the position
/// sampler, so they must tolerate concurrent `position_ms` calls.
pub trait EngineSession: Send + Sync {
    /// Begin preparing the source; completion is signalled through
    /// [`SessionEvents::prepared`] or [`SessionEvents::failed`]
    fn prepare_async(&self) -> Result<()>;

    fn start(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    fn stop(&self) -> Result<()>;

    fn seek(&self, position_ms: u64) -> Result<()>;

    /// Current playback position in milliseconds
    fn position_ms(&self) -> u64;

    fn is_playing(&self) -> bool;

    /// Free the session's resources; no further calls follow
    fn release(&self);
}

/// Asynchronous notifications a session sends back to the controller
#[derive(Debug)]
pub(crate) enum SessionEvent {
    Prepared,
    Completed,
    Failed(EngineError),
}

/// Callback handle given to a session at creation
///
/// Every session gets a handle tagged with its own generation. Events from a
/// session that has since been replaced or released are discarded, and events
/// sent after the controller shut down go nowhere.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    generation: u64,
    tx: WeakUnboundedSender<Message>,
}

impl SessionEvents {
    pub(crate) fn new(generation: u64, tx: WeakUnboundedSender<Message>) -> Self {
        Self { generation, tx }
    }

    /// A handle connected to nothing; every event is dropped
    ///
    /// Lets engine implementations drive their sessions outside a controller.
    pub fn detached() -> Self {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        Self::new(0, tx.downgrade())
    }

    /// Generation of the session this handle belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The source is ready to start
    pub fn prepared(&self) {
        self.send(SessionEvent::Prepared);
    }

    /// Playback reached the end of the source
    pub fn completed(&self) {
        self.send(SessionEvent::Completed);
    }

    /// The session failed while preparing or playing
    pub fn failed(&self, error: EngineError) {
        self.send(SessionEvent::Failed(error));
    }

    fn send(&self, event: SessionEvent) {
        if let Some(tx) = self.tx.upgrade() {
            let _ = tx.send(Message::Session {
                generation: self.generation,
                event,
            });
        }
    }
}

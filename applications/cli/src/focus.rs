//! In-process audio focus arbiter
//!
//! Hands focus to one client at a time. A new grant takes focus away from
//! the previous holder with a permanent loss. The shell uses
//! [`LocalFocusArbiter::interrupt`] to stand in for other applications.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cadence_playback::{AudioFocus, FocusChange, FocusEvents, FocusRequest};
use tracing::{debug, info};

struct Holder {
    client: u64,
    kind: FocusRequest,
    listener: FocusEvents,
}

#[derive(Default)]
struct Inner {
    holder: Mutex<Option<Holder>>,
    next_client: AtomicU64,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Option<Holder>> {
        self.holder.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Grants focus to one client at a time
#[derive(Clone, Default)]
pub struct LocalFocusArbiter {
    inner: Arc<Inner>,
}

impl LocalFocusArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new focus client with its own identity
    pub fn client(&self) -> FocusClient {
        FocusClient {
            id: self.inner.next_client.fetch_add(1, Ordering::Relaxed),
            inner: Arc::clone(&self.inner),
        }
    }

    /// Whether anyone holds focus
    pub fn is_held(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// Deliver `change` to the current holder as if another application
    /// took or returned focus
    ///
    /// A permanent loss ends the grant. Returns `false` when nobody holds
    /// focus.
    pub fn interrupt(&self, change: FocusChange) -> bool {
        let mut holder = self.inner.lock();
        let Some(current) = holder.as_ref() else {
            return false;
        };
        info!(?change, client = current.client, kind = ?current.kind, "Delivering focus change");
        current.listener.notify(change);
        if change == FocusChange::Loss {
            *holder = None;
        }
        true
    }
}

/// One application's connection to the arbiter
pub struct FocusClient {
    id: u64,
    inner: Arc<Inner>,
}

impl FocusClient {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl AudioFocus for FocusClient {
    fn request(&self, kind: FocusRequest, listener: FocusEvents) -> bool {
        let mut holder = self.inner.lock();
        if let Some(previous) = holder.take() {
            if previous.client != self.id {
                debug!(from = previous.client, to = self.id, "Focus moved");
                previous.listener.notify(FocusChange::Loss);
            }
        }
        *holder = Some(Holder {
            client: self.id,
            kind,
            listener,
        });
        true
    }

    fn abandon(&self) {
        let mut holder = self.inner.lock();
        if holder.as_ref().is_some_and(|h| h.client == self.id) {
            debug!(client = self.id, "Focus abandoned");
            *holder = None;
        }
    }
}

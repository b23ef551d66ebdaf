//! Clock-driven engine
//!
//! Sessions do not decode anything. Position advances with the tokio clock,
//! scaled by a speed factor, and completion fires when it reaches the track
//! duration. Preparing fails when the track's file is gone.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cadence_core::Track;
use cadence_playback::{AudioEngine, EngineError, EngineSession, SessionEvents};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Duration assumed for tracks whose length is unknown
pub const FALLBACK_DURATION_MS: u64 = 180_000;

/// Engine whose sessions advance with the clock
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    speed: f64,
}

impl SimulatedEngine {
    /// Create an engine; `speed` 2.0 plays twice as fast as real time
    pub fn new(speed: f64) -> Self {
        Self { speed }
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl AudioEngine for SimulatedEngine {
    fn create_session(
        &self,
        track: &Track,
        events: SessionEvents,
    ) -> cadence_playback::Result<Arc<dyn EngineSession>> {
        let runtime = Handle::try_current()
            .map_err(|e| EngineError::invalid_state(format!("no async runtime: {e}")))?;

        let duration_ms = match track.duration_ms {
            0 => FALLBACK_DURATION_MS,
            ms => ms,
        };
        debug!(track = %track.id, duration_ms, "Creating simulated session");

        Ok(Arc::new(SimulatedSession {
            source: PathBuf::from(&track.locator),
            duration_ms,
            speed: self.speed,
            events,
            runtime,
            clock: Mutex::new(Clock::default()),
        }))
    }
}

#[derive(Debug, Default)]
struct Clock {
    /// Position at the last start, pause or seek
    base_ms: u64,
    /// Set while running
    started_at: Option<Instant>,
    prepare: Option<JoinHandle<()>>,
    completion: Option<JoinHandle<()>>,
    released: bool,
}

impl Clock {
    fn cancel_completion(&mut self) {
        if let Some(handle) = self.completion.take() {
            handle.abort();
        }
    }
}

/// One simulated track
pub struct SimulatedSession {
    source: PathBuf,
    duration_ms: u64,
    speed: f64,
    events: SessionEvents,
    runtime: Handle,
    clock: Mutex<Clock>,
}

impl SimulatedSession {
    fn lock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn position_of(&self, clock: &Clock) -> u64 {
        let elapsed = clock.started_at.map_or(0, |started| {
            (started.elapsed().as_micros() as f64 * self.speed / 1000.0) as u64
        });
        clock.base_ms.saturating_add(elapsed).min(self.duration_ms)
    }

    fn ensure_live(clock: &Clock) -> cadence_playback::Result<()> {
        if clock.released {
            return Err(EngineError::invalid_state("session released"));
        }
        Ok(())
    }

    /// Schedule the completion callback for the remaining play time
    fn schedule_completion(&self, clock: &mut Clock) {
        clock.cancel_completion();
        let remaining_ms = self.duration_ms.saturating_sub(clock.base_ms);
        let wait = Duration::from_secs_f64(remaining_ms as f64 / 1000.0 / self.speed);
        let events = self.events.clone();
        clock.completion = Some(self.runtime.spawn(async move {
            tokio::time::sleep(wait).await;
            events.completed();
        }));
    }
}

impl EngineSession for SimulatedSession {
    fn prepare_async(&self) -> cadence_playback::Result<()> {
        let mut clock = self.lock();
        Self::ensure_live(&clock)?;

        let source = self.source.clone();
        let events = self.events.clone();
        clock.prepare = Some(self.runtime.spawn(async move {
            match tokio::fs::try_exists(&source).await {
                Ok(true) => events.prepared(),
                Ok(false) => events.failed(EngineError::load(format!(
                    "{} does not exist",
                    source.display()
                ))),
                Err(e) => events.failed(EngineError::Io(e)),
            }
        }));
        Ok(())
    }

    fn start(&self) -> cadence_playback::Result<()> {
        let mut clock = self.lock();
        Self::ensure_live(&clock)?;
        if clock.started_at.is_none() {
            clock.started_at = Some(Instant::now());
            self.schedule_completion(&mut clock);
        }
        Ok(())
    }

    fn pause(&self) -> cadence_playback::Result<()> {
        let mut clock = self.lock();
        Self::ensure_live(&clock)?;
        clock.base_ms = self.position_of(&clock);
        clock.started_at = None;
        clock.cancel_completion();
        Ok(())
    }

    fn stop(&self) -> cadence_playback::Result<()> {
        let mut clock = self.lock();
        Self::ensure_live(&clock)?;
        clock.base_ms = 0;
        clock.started_at = None;
        clock.cancel_completion();
        Ok(())
    }

    fn seek(&self, position_ms: u64) -> cadence_playback::Result<()> {
        let mut clock = self.lock();
        Self::ensure_live(&clock)?;
        clock.base_ms = position_ms.min(self.duration_ms);
        if clock.started_at.is_some() {
            clock.started_at = Some(Instant::now());
            self.schedule_completion(&mut clock);
        }
        Ok(())
    }

    fn position_ms(&self) -> u64 {
        let clock = self.lock();
        self.position_of(&clock)
    }

    fn is_playing(&self) -> bool {
        let clock = self.lock();
        !clock.released && clock.started_at.is_some()
    }

    fn release(&self) {
        let mut clock = self.lock();
        clock.released = true;
        clock.started_at = None;
        clock.cancel_completion();
        if let Some(handle) = clock.prepare.take() {
            handle.abort();
        }
    }
}

impl Drop for SimulatedSession {
    fn drop(&mut self) {
        self.release();
    }
}

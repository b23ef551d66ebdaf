//! Shared test doubles for controller tests
//!
//! `FakeEngine` hands out `FakeSession`s that record every call. With
//! auto-prepare enabled a session reports ready as soon as preparation is
//! requested; otherwise tests drive readiness explicitly.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cadence_core::{Track, TrackId};
use cadence_playback::{
    AudioEngine, AudioFocus, ControllerConfig, ControllerEvent, EngineError, EngineSession,
    FocusChange, FocusEvents, FocusRequest, PlaybackController, SessionEvents,
};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Prepare,
    Start,
    Pause,
    Stop,
    Seek(u64),
    Release,
}

#[derive(Default)]
struct SessionState {
    prepared: bool,
    playing: bool,
    position_ms: u64,
    calls: Vec<Call>,
}

pub struct FakeSession {
    pub track: Track,
    events: SessionEvents,
    auto_prepare: bool,
    state: Mutex<SessionState>,
    pub fail_start: AtomicBool,
    pub fail_pause: AtomicBool,
    pub fail_seek: AtomicBool,
}

impl FakeSession {
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    pub fn released(&self) -> bool {
        self.count(Call::Release) > 0
    }

    pub fn set_position(&self, position_ms: u64) {
        self.state.lock().unwrap().position_ms = position_ms;
    }

    /// Report readiness, as the engine would after decoding headers
    pub fn finish_prepare(&self) {
        self.events.prepared();
    }

    /// Report that playback reached the end of the source
    pub fn complete(&self) {
        self.state.lock().unwrap().playing = false;
        self.events.completed();
    }

    pub fn fail(&self, message: &str) {
        self.events.failed(EngineError::load(message));
    }

    pub fn generation(&self) -> u64 {
        self.events.generation()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl EngineSession for FakeSession {
    fn prepare_async(&self) -> Result<(), EngineError> {
        self.record(Call::Prepare);
        if self.auto_prepare {
            self.state.lock().unwrap().prepared = true;
            self.events.prepared();
        }
        Ok(())
    }

    fn start(&self) -> Result<(), EngineError> {
        self.record(Call::Start);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(EngineError::invalid_state("start refused"));
        }
        self.state.lock().unwrap().playing = true;
        Ok(())
    }

    fn pause(&self) -> Result<(), EngineError> {
        self.record(Call::Pause);
        if self.fail_pause.load(Ordering::SeqCst) {
            return Err(EngineError::invalid_state("pause refused"));
        }
        self.state.lock().unwrap().playing = false;
        Ok(())
    }

    fn stop(&self) -> Result<(), EngineError> {
        self.record(Call::Stop);
        self.state.lock().unwrap().playing = false;
        Ok(())
    }

    fn seek(&self, position_ms: u64) -> Result<(), EngineError> {
        self.record(Call::Seek(position_ms));
        if self.fail_seek.load(Ordering::SeqCst) {
            return Err(EngineError::invalid_state("seek refused"));
        }
        self.state.lock().unwrap().position_ms = position_ms;
        Ok(())
    }

    fn position_ms(&self) -> u64 {
        self.state.lock().unwrap().position_ms
    }

    fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    fn release(&self) {
        self.record(Call::Release);
    }
}

pub struct FakeEngine {
    auto_prepare: bool,
    sessions: Mutex<Vec<Arc<FakeSession>>>,
    pub fail_create: AtomicBool,
}

impl FakeEngine {
    pub fn new(auto_prepare: bool) -> Arc<Self> {
        Arc::new(Self {
            auto_prepare,
            sessions: Mutex::new(Vec::new()),
            fail_create: AtomicBool::new(false),
        })
    }

    pub fn sessions(&self) -> Vec<Arc<FakeSession>> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn last_session(&self) -> Arc<FakeSession> {
        self.sessions
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no session created")
    }

    pub fn loaded_ids(&self) -> Vec<i64> {
        self.sessions().iter().map(|s| s.track.id.get()).collect()
    }
}

impl AudioEngine for FakeEngine {
    fn create_session(
        &self,
        track: &Track,
        events: SessionEvents,
    ) -> Result<Arc<dyn EngineSession>, EngineError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(EngineError::load("unsupported format"));
        }
        let session = Arc::new(FakeSession {
            track: track.clone(),
            events,
            auto_prepare: self.auto_prepare,
            state: Mutex::new(SessionState::default()),
            fail_start: AtomicBool::new(false),
            fail_pause: AtomicBool::new(false),
            fail_seek: AtomicBool::new(false),
        });
        self.sessions.lock().unwrap().push(Arc::clone(&session));
        Ok(session)
    }
}

pub struct FakeFocus {
    pub grant: AtomicBool,
    pub requests: AtomicUsize,
    pub abandons: AtomicUsize,
    listener: Mutex<Option<FocusEvents>>,
}

impl FakeFocus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            grant: AtomicBool::new(true),
            requests: AtomicUsize::new(0),
            abandons: AtomicUsize::new(0),
            listener: Mutex::new(None),
        })
    }

    pub fn deny(&self) {
        self.grant.store(false, Ordering::SeqCst);
    }

    /// Deliver a focus change to the last requester
    pub fn notify(&self, change: FocusChange) {
        if let Some(listener) = self.listener.lock().unwrap().as_ref() {
            listener.notify(change);
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn abandon_count(&self) -> usize {
        self.abandons.load(Ordering::SeqCst)
    }
}

impl AudioFocus for FakeFocus {
    fn request(&self, _kind: FocusRequest, listener: FocusEvents) -> bool {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let granted = self.grant.load(Ordering::SeqCst);
        if granted {
            *self.listener.lock().unwrap() = Some(listener);
        }
        granted
    }

    fn abandon(&self) {
        self.abandons.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub controller: PlaybackController,
    pub engine: Arc<FakeEngine>,
    pub focus: Arc<FakeFocus>,
    pub events: broadcast::Receiver<ControllerEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(true, ControllerConfig::default())
    }

    pub fn manual_prepare() -> Self {
        Self::with(false, ControllerConfig::default())
    }

    pub fn with(auto_prepare: bool, config: ControllerConfig) -> Self {
        let engine = FakeEngine::new(auto_prepare);
        let focus = FakeFocus::new();
        let controller = PlaybackController::spawn(engine.clone(), focus.clone(), config);
        let events = controller.subscribe();
        Self {
            controller,
            engine,
            focus,
            events,
        }
    }

    /// Let callbacks triggered by earlier messages run to completion
    pub async fn settle(&self) {
        for _ in 0..4 {
            self.controller.flush().await;
        }
    }

    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn current_id(&self) -> Option<i64> {
        self.controller
            .snapshot()
            .current_track
            .map(|track| track.id.get())
    }
}

pub fn track(id: i64) -> Track {
    Track::new(TrackId::new(id), format!("Track {id}"), format!("/music/{id}.flac"))
        .with_artist(1, "Artist")
        .with_album("Album")
        .with_duration_ms(180_000)
}

pub fn playlist(ids: &[i64]) -> Vec<Track> {
    ids.iter().map(|&id| track(id)).collect()
}

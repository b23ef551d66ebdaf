//! Playback controller
//!
//! [`PlaybackController`] is a cheap, clonable handle. All state lives in a
//! single task spawned by [`PlaybackController::spawn`]; user intents, engine
//! session events, focus changes and prepare timeouts all arrive on that
//! task's mailbox and are applied one at a time, in arrival order.
//!
//! Intent methods resolve once the task has applied the intent and published
//! the resulting snapshot. They never fail: problems are reported through
//! [`ControllerEvent::Error`].

use std::sync::Arc;

use cadence_core::Track;
use futures_util::Stream;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::{AudioEngine, EngineSession, SessionEvent, SessionEvents};
use crate::error::{EngineError, PlaybackError};
use crate::events::ControllerEvent;
use crate::focus::{AudioFocus, FocusChange, FocusEvents};
use crate::navigation;
use crate::position::{sample_positions, PositionProbe};
use crate::state::{PlaybackSnapshot, PlaybackState};
use crate::types::{ControllerConfig, LoopMode, TrackState};

const EVENT_CAPACITY: usize = 64;

/// Messages processed by the controller task
#[derive(Debug)]
pub(crate) enum Message {
    Intent(Intent, oneshot::Sender<()>),
    Session { generation: u64, event: SessionEvent },
    Focus(FocusChange),
    PrepareTimedOut { generation: u64 },
}

#[derive(Debug)]
pub(crate) enum Intent {
    Play(Option<Track>),
    Pause,
    Stop,
    SkipPrevious,
    SkipNext,
    Seek(u64),
    CycleLoop,
    SetLoopMode(LoopMode),
    SetPlaylist(Vec<Track>),
    SelectTrack(Option<Track>),
    Flush,
    Shutdown,
}

/// Who asked for a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    User,
    Auto,
}

/// Handle to a running playback controller
#[derive(Clone)]
pub struct PlaybackController {
    tx: mpsc::UnboundedSender<Message>,
    snapshot: watch::Receiver<PlaybackSnapshot>,
    events: broadcast::Sender<ControllerEvent>,
    probe: PositionProbe,
    config: Arc<ControllerConfig>,
}

impl PlaybackController {
    /// Spawn the controller task on the current tokio runtime
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn spawn(
        engine: Arc<dyn AudioEngine>,
        focus: Arc<dyn AudioFocus>,
        config: ControllerConfig,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = PlaybackState::new(config.loop_mode);
        let (snapshot_tx, snapshot) = watch::channel(state.snapshot(false));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let probe = PositionProbe::default();
        let config = Arc::new(config);

        let task = ControllerTask {
            engine,
            arbiter: focus,
            config: Arc::clone(&config),
            mailbox: tx.downgrade(),
            state,
            session: None,
            generation: 0,
            focus: FocusGrant::None,
            resume_on_gain: false,
            snapshot: snapshot_tx,
            events: events.clone(),
            probe: probe.clone(),
        };
        tokio::spawn(task.run(rx));

        Self {
            tx,
            snapshot,
            events,
            probe,
            config,
        }
    }

    // ===== Intents =====

    /// Play `track`, or resolve a target: the selected track, then the bound
    /// track, then the first playlist entry
    pub async fn play(&self, track: Option<Track>) {
        self.send(Intent::Play(track)).await;
    }

    pub async fn pause(&self) {
        self.send(Intent::Pause).await;
    }

    /// Stop and release the engine session
    pub async fn stop(&self) {
        self.send(Intent::Stop).await;
    }

    /// Go to the previous track, or restart the current one once the rewind
    /// threshold has elapsed
    pub async fn skip_previous(&self) {
        self.send(Intent::SkipPrevious).await;
    }

    pub async fn skip_next(&self) {
        self.send(Intent::SkipNext).await;
    }

    pub async fn seek(&self, position_ms: u64) {
        self.send(Intent::Seek(position_ms)).await;
    }

    /// Advance the loop mode: None, One, All, None
    pub async fn cycle_loop(&self) {
        self.send(Intent::CycleLoop).await;
    }

    pub async fn set_loop_mode(&self, mode: LoopMode) {
        self.send(Intent::SetLoopMode(mode)).await;
    }

    /// Replace the playlist; the bound track, if any, keeps playing
    pub async fn set_playlist(&self, tracks: Vec<Track>) {
        self.send(Intent::SetPlaylist(tracks)).await;
    }

    /// Highlight a track; the next `play(None)` plays it
    pub async fn select_track(&self, track: Option<Track>) {
        self.send(Intent::SelectTrack(track)).await;
    }

    /// Resolves once every message queued before it has been applied
    pub async fn flush(&self) {
        self.send(Intent::Flush).await;
    }

    /// Release the engine session and focus, then stop the controller task
    ///
    /// Intents sent afterwards are ignored.
    pub async fn shutdown(&self) {
        self.send(Intent::Shutdown).await;
    }

    // ===== Observation =====

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified whenever the snapshot changes
    pub fn watch(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Fresh stream of playback positions in milliseconds
    ///
    /// Emits 0 while no session is prepared. Each call starts an independent
    /// sampler that stops when the stream is dropped.
    pub fn positions(&self) -> impl Stream<Item = u64> + Send + 'static {
        sample_positions(self.probe.clone(), self.config.position_interval())
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    async fn send(&self, intent: Intent) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Message::Intent(intent, ack)).is_err() {
            return;
        }
        let _ = done.await;
    }
}

/// Where the controller stands with the focus arbiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusGrant {
    None,
    Held,
    /// Granted, but another application holds focus for now
    Suspended,
}

/// Engine session owned by the controller task
struct ActiveSession {
    session: Arc<dyn EngineSession>,
    generation: u64,
    prepared: bool,
    start_when_ready: bool,
    pending_seek_ms: Option<u64>,
    timeout: Option<JoinHandle<()>>,
}

impl ActiveSession {
    fn cancel_timeout(&mut self) {
        if let Some(timeout) = self.timeout.take() {
            timeout.abort();
        }
    }
}

struct ControllerTask {
    engine: Arc<dyn AudioEngine>,
    arbiter: Arc<dyn AudioFocus>,
    config: Arc<ControllerConfig>,
    mailbox: mpsc::WeakUnboundedSender<Message>,
    state: PlaybackState,
    session: Option<ActiveSession>,
    generation: u64,
    focus: FocusGrant,
    /// Playback was active when a transient focus loss paused it
    resume_on_gain: bool,
    snapshot: watch::Sender<PlaybackSnapshot>,
    events: broadcast::Sender<ControllerEvent>,
    probe: PositionProbe,
}

impl ControllerTask {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Message>) {
        debug!("Playback controller started");
        while let Some(message) = rx.recv().await {
            match message {
                Message::Intent(Intent::Shutdown, ack) => {
                    self.teardown();
                    self.publish();
                    let _ = ack.send(());
                    break;
                }
                Message::Intent(intent, ack) => {
                    self.handle_intent(intent);
                    self.publish();
                    let _ = ack.send(());
                }
                Message::Session { generation, event } => {
                    self.handle_session_event(generation, event);
                    self.publish();
                }
                Message::Focus(change) => {
                    self.handle_focus_change(change);
                    self.publish();
                }
                Message::PrepareTimedOut { generation } => {
                    self.handle_prepare_timeout(generation);
                    self.publish();
                }
            }
        }
        // Also reached when every handle was dropped.
        self.teardown();
        self.publish();
        debug!("Playback controller stopped");
    }

    fn handle_intent(&mut self, intent: Intent) {
        match intent {
            Intent::Play(track) => self.play(track),
            Intent::Pause => self.pause(),
            Intent::Stop => self.stop(),
            Intent::SkipPrevious => self.skip_previous(),
            Intent::SkipNext => self.skip_next(),
            Intent::Seek(position_ms) => self.seek(position_ms),
            Intent::CycleLoop => {
                self.state.loop_mode = self.state.loop_mode.cycle();
                debug!(loop_mode = ?self.state.loop_mode, "Loop mode cycled");
            }
            Intent::SetLoopMode(mode) => self.state.loop_mode = mode,
            Intent::SetPlaylist(tracks) => {
                debug!(len = tracks.len(), "Playlist replaced");
                self.state.playlist = tracks;
            }
            Intent::SelectTrack(track) => self.state.selected_track = track,
            Intent::Flush | Intent::Shutdown => {}
        }
    }

    // ===== User intents =====

    fn play(&mut self, explicit: Option<Track>) {
        let selected = self.state.selected_track.take();
        let target = explicit
            .or(selected)
            .or_else(|| self.state.current_track.clone())
            .or_else(|| self.state.playlist.first().cloned());

        let Some(target) = target else {
            warn!("Play requested with nothing to play");
            self.report(PlaybackError::PlayFailed);
            return;
        };

        if self.is_bound(&target) {
            if self.state.track_state == TrackState::Playing {
                return;
            }
            self.resume(Origin::User);
        } else {
            self.load_and_play(target, Origin::User);
        }
    }

    fn pause(&mut self) {
        self.resume_on_gain = false;

        if self.state.current_track.is_none() {
            if self
                .session
                .as_ref()
                .is_some_and(|active| active.session.is_playing())
            {
                self.report(PlaybackError::PauseFailed);
            }
            return;
        }

        match self.state.track_state {
            TrackState::Playing => {
                let Some(active) = &self.session else { return };
                match active.session.pause() {
                    Ok(()) => self.state.track_state = TrackState::Paused,
                    Err(err) => self.engine_failure(PlaybackError::Unexpected, "pause", &err),
                }
            }
            TrackState::Paused => {}
            TrackState::Stopped => {
                if let Some(active) = &mut self.session {
                    active.start_when_ready = false;
                }
            }
        }
    }

    fn stop(&mut self) {
        self.resume_on_gain = false;
        self.release_session();
        self.state.unbind();
    }

    fn skip_next(&mut self) {
        let target = self
            .state
            .current_track
            .as_ref()
            .and_then(|current| navigation::following(&self.state.playlist, current.id))
            .cloned();

        match target {
            Some(track) => self.load_and_play(track, Origin::User),
            None => self.report(PlaybackError::SkipNextFailed),
        }
    }

    fn skip_previous(&mut self) {
        let Some(current) = self.state.current_track.clone() else {
            self.report(PlaybackError::SkipPreviousFailed);
            return;
        };
        if self.state.playlist.is_empty() {
            self.report(PlaybackError::SkipPreviousFailed);
            return;
        }

        if self.elapsed_ms() < self.config.rewind_threshold_ms {
            match navigation::preceding(&self.state.playlist, current.id).cloned() {
                Some(track) => self.load_and_play(track, Origin::User),
                None => self.report(PlaybackError::SkipPreviousFailed),
            }
            return;
        }

        if self.state.track_state == TrackState::Playing {
            self.restart_in_place();
        } else {
            self.load_and_play(current, Origin::User);
        }
    }

    fn seek(&mut self, position_ms: u64) {
        if self.session.is_none() || !self.acquire_focus() {
            return;
        }
        let playing = self.state.track_state == TrackState::Playing;
        let Some(active) = &mut self.session else { return };

        if !active.prepared {
            active.pending_seek_ms = Some(position_ms);
            return;
        }

        let session = Arc::clone(&active.session);
        if playing {
            if let Err(err) = session.pause() {
                self.engine_failure(PlaybackError::Unexpected, "pause", &err);
                return;
            }
        }
        if let Err(err) = session.seek(position_ms) {
            self.report_engine_error(PlaybackError::Unexpected, "seek", &err);
        }
        if playing {
            if let Err(err) = session.start() {
                self.engine_failure(PlaybackError::PlayFailed, "start", &err);
            }
        }
    }

    // ===== Engine events =====

    fn handle_session_event(&mut self, generation: u64, event: SessionEvent) {
        let Some(active) = &self.session else {
            debug!(generation, ?event, "Ignoring event for released session");
            return;
        };
        if active.generation != generation {
            debug!(generation, ?event, "Ignoring event for stale session");
            return;
        }

        match event {
            SessionEvent::Prepared => self.on_prepared(),
            SessionEvent::Completed => self.on_completed(),
            SessionEvent::Failed(err) => {
                let kind = if active.prepared {
                    PlaybackError::Unexpected
                } else {
                    PlaybackError::PlayFailed
                };
                error!(error = %err, "Engine session failed");
                self.report(kind);
                self.abort_to_stopped();
            }
        }
    }

    fn on_prepared(&mut self) {
        let Some(active) = &mut self.session else { return };
        if active.prepared {
            return;
        }
        active.prepared = true;
        active.cancel_timeout();
        let session = Arc::clone(&active.session);
        let pending_seek = active.pending_seek_ms.take();
        let start = std::mem::take(&mut active.start_when_ready);
        self.probe.attach(Arc::clone(&session));

        if let Some(position_ms) = pending_seek {
            if let Err(err) = session.seek(position_ms) {
                self.report_engine_error(PlaybackError::Unexpected, "seek", &err);
            }
        }

        if start {
            match session.start() {
                Ok(()) => {
                    self.state.track_state = TrackState::Playing;
                    debug!(track = ?self.current_title(), "Playback started");
                }
                Err(err) => self.engine_failure(PlaybackError::PlayFailed, "start", &err),
            }
        } else {
            self.state.track_state = TrackState::Paused;
        }
    }

    fn on_completed(&mut self) {
        if self.state.track_state != TrackState::Playing {
            return;
        }
        let Some(current) = self.state.current_track.clone() else {
            return;
        };
        debug!(track = %current.title, loop_mode = ?self.state.loop_mode, "Track completed");

        let next = match self.state.loop_mode {
            LoopMode::One => {
                self.restart_in_place();
                return;
            }
            LoopMode::None => navigation::following_in_order(&self.state.playlist, current.id),
            LoopMode::All => navigation::position_of(&self.state.playlist, current.id)
                .and_then(|_| navigation::following(&self.state.playlist, current.id)),
        };

        match next.cloned() {
            Some(track) => self.load_and_play(track, Origin::Auto),
            None => {
                info!("End of playlist reached");
                self.stop();
                self.emit(ControllerEvent::TrackAutoAdvanced(None));
            }
        }
    }

    fn handle_prepare_timeout(&mut self, generation: u64) {
        let stuck = self
            .session
            .as_ref()
            .is_some_and(|active| active.generation == generation && !active.prepared);
        if !stuck {
            return;
        }
        warn!(
            timeout_ms = ?self.config.prepare_timeout_ms,
            track = ?self.current_title(),
            "Engine session did not prepare in time"
        );
        self.report(PlaybackError::PlayFailed);
        self.abort_to_stopped();
    }

    // ===== Focus =====

    fn handle_focus_change(&mut self, change: FocusChange) {
        debug!(?change, "Audio focus changed");
        match change {
            FocusChange::Loss => {
                self.resume_on_gain = false;
                self.release_session();
                let had_track = self.state.unbind().is_some();
                self.abandon_focus();
                if had_track {
                    self.emit(ControllerEvent::TrackAutoAdvanced(None));
                }
            }
            FocusChange::LossTransient | FocusChange::LossTransientCanDuck => {
                if self.focus == FocusGrant::Held {
                    self.focus = FocusGrant::Suspended;
                }
                let playing = self.state.track_state == TrackState::Playing;
                let Some(active) = &mut self.session else { return };
                if playing {
                    match active.session.pause() {
                        Ok(()) => {
                            self.state.track_state = TrackState::Paused;
                            self.resume_on_gain = true;
                        }
                        Err(err) => self.engine_failure(PlaybackError::Unexpected, "pause", &err),
                    }
                } else if active.start_when_ready {
                    active.start_when_ready = false;
                    self.resume_on_gain = true;
                }
            }
            FocusChange::Gain => {
                if self.focus == FocusGrant::None {
                    debug!("Ignoring focus gain without a grant");
                    return;
                }
                self.focus = FocusGrant::Held;
                if std::mem::take(&mut self.resume_on_gain) && self.session.is_some() {
                    self.resume(Origin::Auto);
                    if self.session.is_some() {
                        let current = self.state.current_track.clone();
                        self.emit(ControllerEvent::TrackAutoAdvanced(current));
                    }
                }
            }
        }
    }

    /// Ask the arbiter for focus unless it is already held
    ///
    /// A suspended grant is requested again; a refusal keeps it suspended
    /// so a later gain still reaches the controller.
    fn acquire_focus(&mut self) -> bool {
        if self.focus == FocusGrant::Held {
            return true;
        }
        let listener = FocusEvents::new(self.mailbox.clone());
        let granted = self.arbiter.request(self.config.focus_request, listener);
        debug!(granted, "Requested audio focus");
        if granted {
            self.focus = FocusGrant::Held;
        }
        granted
    }

    fn abandon_focus(&mut self) {
        if std::mem::replace(&mut self.focus, FocusGrant::None) != FocusGrant::None {
            self.arbiter.abandon();
        }
    }

    fn focus_denied(&mut self, origin: Origin) {
        match origin {
            Origin::User => {
                warn!("Audio focus denied");
                self.report(PlaybackError::PlayFailed);
            }
            Origin::Auto => {
                warn!("Audio focus denied during automatic transition, stopping");
                self.stop();
                self.emit(ControllerEvent::TrackAutoAdvanced(None));
            }
        }
    }

    // ===== Session management =====

    /// Start the bound session without reloading
    fn resume(&mut self, origin: Origin) {
        if !self.acquire_focus() {
            self.focus_denied(origin);
            return;
        }
        self.resume_on_gain = false;
        let Some(active) = &mut self.session else { return };
        if !active.prepared {
            active.start_when_ready = true;
            return;
        }
        match active.session.start() {
            Ok(()) => self.state.track_state = TrackState::Playing,
            Err(err) => self.engine_failure(PlaybackError::PlayFailed, "start", &err),
        }
    }

    /// Release the current session and bind a fresh one for `track`
    fn load_and_play(&mut self, track: Track, origin: Origin) {
        if !self.acquire_focus() {
            self.focus_denied(origin);
            return;
        }

        self.release_session();
        self.resume_on_gain = false;
        self.state.track_state = TrackState::Stopped;
        self.generation += 1;
        let generation = self.generation;
        let events = SessionEvents::new(generation, self.mailbox.clone());

        let session = match self.engine.create_session(&track, events) {
            Ok(session) => session,
            Err(err) => {
                error!(track = %track.title, error = %err, "Failed to create engine session");
                self.report(PlaybackError::PlayFailed);
                self.state.unbind();
                return;
            }
        };

        debug!(track = %track.title, generation, "Loading track");
        let previous_id = self.state.current_track.as_ref().map(|t| t.id);
        let changed = previous_id != Some(track.id);
        self.state.bind(track);
        self.session = Some(ActiveSession {
            session: Arc::clone(&session),
            generation,
            prepared: false,
            start_when_ready: true,
            pending_seek_ms: None,
            timeout: None,
        });

        if let Err(err) = session.prepare_async() {
            error!(error = %err, "Failed to begin preparing engine session");
            self.report(PlaybackError::PlayFailed);
            self.abort_to_stopped();
            return;
        }
        self.arm_prepare_timeout(generation);

        if origin == Origin::Auto && changed {
            let current = self.state.current_track.clone();
            self.emit(ControllerEvent::TrackAutoAdvanced(current));
        }
    }

    /// Pause, rewind to zero and start the bound session
    fn restart_in_place(&mut self) {
        let Some(active) = &self.session else { return };
        let session = Arc::clone(&active.session);
        if let Err(err) = session.pause() {
            self.engine_failure(PlaybackError::Unexpected, "pause", &err);
            return;
        }
        if let Err(err) = session.seek(0) {
            self.report_engine_error(PlaybackError::Unexpected, "seek", &err);
        }
        match session.start() {
            Ok(()) => self.state.track_state = TrackState::Playing,
            Err(err) => self.engine_failure(PlaybackError::PlayFailed, "start", &err),
        }
    }

    fn arm_prepare_timeout(&mut self, generation: u64) {
        let Some(timeout) = self.config.prepare_timeout() else {
            return;
        };
        let mailbox = self.mailbox.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(tx) = mailbox.upgrade() {
                let _ = tx.send(Message::PrepareTimedOut { generation });
            }
        });
        if let Some(active) = &mut self.session {
            active.timeout = Some(handle);
        }
    }

    /// Stop and release the engine session, if any
    fn release_session(&mut self) {
        let Some(mut active) = self.session.take() else {
            return;
        };
        active.cancel_timeout();
        self.probe.detach();

        if active.prepared {
            if let Err(err) = active.session.stop() {
                self.report_engine_error(PlaybackError::Unexpected, "stop", &err);
            }
        }
        active.session.release();
        debug!(generation = active.generation, "Released engine session");
    }

    /// Release everything after a failure; observers learn the track is gone
    fn abort_to_stopped(&mut self) {
        self.resume_on_gain = false;
        self.release_session();
        if self.state.unbind().is_some() {
            self.emit(ControllerEvent::TrackAutoAdvanced(None));
        }
    }

    fn teardown(&mut self) {
        self.resume_on_gain = false;
        self.release_session();
        self.state.unbind();
        self.abandon_focus();
    }

    // ===== Helpers =====

    fn is_bound(&self, track: &Track) -> bool {
        self.session.is_some()
            && self
                .state
                .current_track
                .as_ref()
                .is_some_and(|current| current.id == track.id)
    }

    /// Position within the bound track; 0 while its session is preparing
    fn elapsed_ms(&self) -> u64 {
        match &self.session {
            Some(active) if active.prepared => active.session.position_ms(),
            _ => 0,
        }
    }

    fn current_title(&self) -> Option<&str> {
        self.state.current_track.as_ref().map(|t| t.title.as_str())
    }

    /// Report an engine failure and fall back to stopped
    fn engine_failure(&mut self, kind: PlaybackError, operation: &str, err: &EngineError) {
        self.report_engine_error(kind, operation, err);
        self.resume_on_gain = false;
        self.release_session();
        self.state.unbind();
    }

    fn report_engine_error(&mut self, kind: PlaybackError, operation: &str, err: &EngineError) {
        error!(operation, error = %err, "Engine call failed");
        self.report(kind);
    }

    fn report(&self, kind: PlaybackError) {
        self.emit(ControllerEvent::Error(kind));
    }

    fn emit(&self, event: ControllerEvent) {
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        let next = self.state.snapshot(self.session.is_some());
        debug_assert!(next.is_consistent(), "inconsistent playback state: {next:?}");
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

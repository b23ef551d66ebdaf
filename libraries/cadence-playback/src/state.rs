//! Playback state owned by the controller task

use cadence_core::Track;
use serde::{Deserialize, Serialize};

use crate::types::{LoopMode, TrackState};

/// Observable view of the controller state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub track_state: TrackState,

    /// Track bound to the live engine session, set as soon as the session is
    /// created (before it is prepared)
    pub current_track: Option<Track>,

    /// Track bound immediately before the current one
    pub previous_track: Option<Track>,

    pub loop_mode: LoopMode,

    /// An engine session is allocated
    pub engine_present: bool,

    pub playlist_len: usize,
}

impl PlaybackSnapshot {
    /// Track to present as "now playing": only while playing or paused
    pub fn now_playing(&self) -> Option<&Track> {
        match self.track_state {
            TrackState::Playing | TrackState::Paused => self.current_track.as_ref(),
            TrackState::Stopped => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.track_state == TrackState::Playing
    }

    /// Whether the state respects the controller's invariants: without an
    /// engine session nothing is bound and the state is stopped
    pub fn is_consistent(&self) -> bool {
        let stopped_without_engine = self.engine_present || self.track_state == TrackState::Stopped;
        let bound_has_engine = self.current_track.is_none() || self.engine_present;
        stopped_without_engine && bound_has_engine
    }
}

/// Mutable state, touched only by the controller task
#[derive(Debug, Default)]
pub(crate) struct PlaybackState {
    pub track_state: TrackState,
    pub current_track: Option<Track>,
    pub previous_track: Option<Track>,
    pub playlist: Vec<Track>,
    pub loop_mode: LoopMode,
    /// Highlighted track, consumed by the next play intent
    pub selected_track: Option<Track>,
}

impl PlaybackState {
    pub fn new(loop_mode: LoopMode) -> Self {
        Self {
            loop_mode,
            ..Self::default()
        }
    }

    /// Bind `track` as current, shifting the old current into previous
    pub fn bind(&mut self, track: Track) {
        self.previous_track = self.current_track.replace(track);
    }

    /// Forget the bound tracks and stop
    pub fn unbind(&mut self) -> Option<Track> {
        self.track_state = TrackState::Stopped;
        self.previous_track = None;
        self.current_track.take()
    }

    pub fn snapshot(&self, engine_present: bool) -> PlaybackSnapshot {
        PlaybackSnapshot {
            track_state: self.track_state,
            current_track: self.current_track.clone(),
            previous_track: self.previous_track.clone(),
            loop_mode: self.loop_mode,
            engine_present,
            playlist_len: self.playlist.len(),
        }
    }
}

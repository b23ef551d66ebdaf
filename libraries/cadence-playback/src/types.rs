//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::focus::FocusRequest;

/// Transport state of the bound track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackState {
    /// No track playing; a session may be preparing
    #[default]
    Stopped,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

/// Loop mode applied when a track completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Advance through the playlist and stop after the last track
    #[default]
    None,

    /// Repeat the current track
    One,

    /// Advance through the playlist, wrapping to the start
    All,
}

impl LoopMode {
    /// Next mode in the `None -> One -> All -> None` cycle
    pub fn cycle(self) -> Self {
        match self {
            Self::None => Self::One,
            Self::One => Self::All,
            Self::All => Self::None,
        }
    }
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Elapsed time below which "previous" goes to the previous track
    /// instead of restarting the current one (default: 3000)
    pub rewind_threshold_ms: u64,

    /// Sampling period of the position stream (default: 250)
    pub position_interval_ms: u64,

    /// How long a session may take to prepare before it is abandoned
    /// (default: 10000, `None` waits forever)
    pub prepare_timeout_ms: Option<u64>,

    /// Kind of focus requested before producing audio (default: Exclusive)
    pub focus_request: FocusRequest,

    /// Initial loop mode (default: None)
    pub loop_mode: LoopMode,
}

impl ControllerConfig {
    /// Position sampling period, never shorter than one millisecond
    pub fn position_interval(&self) -> Duration {
        Duration::from_millis(self.position_interval_ms.max(1))
    }

    pub fn prepare_timeout(&self) -> Option<Duration> {
        self.prepare_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            rewind_threshold_ms: 3000,
            position_interval_ms: 250,
            prepare_timeout_ms: Some(10_000),
            focus_request: FocusRequest::Exclusive,
            loop_mode: LoopMode::None,
        }
    }
}

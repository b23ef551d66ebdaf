//! Cadence - Playback Control
//!
//! Platform-agnostic playback controller for Cadence.
//!
//! This crate provides:
//! - A single-owner playback state machine (stopped, playing, paused)
//! - Audio focus arbitration (loss, transient loss, ducking, regain)
//! - Loop modes (None, One, All) and identity-based playlist navigation
//! - Rewind-or-previous handling with a configurable threshold
//! - A restartable playback position stream
//!
//! # Architecture
//!
//! `cadence-playback` does not decode audio. Platforms supply:
//! - an [`AudioEngine`] that opens one [`EngineSession`] per track
//! - an [`AudioFocus`] service that grants and revokes the right to play
//!
//! The [`PlaybackController`] handle forwards intents to a task that owns all
//! state. Engine callbacks and focus changes are delivered to the same task,
//! so every transition is applied atomically and in order.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cadence_core::Track;
//! use cadence_playback::{AudioEngine, AudioFocus, ControllerConfig, PlaybackController};
//!
//! async fn run(engine: Arc<dyn AudioEngine>, focus: Arc<dyn AudioFocus>, tracks: Vec<Track>) {
//!     let controller = PlaybackController::spawn(engine, focus, ControllerConfig::default());
//!
//!     controller.set_playlist(tracks).await;
//!     controller.play(None).await;
//!     controller.skip_next().await;
//!     controller.pause().await;
//!
//!     println!("{:?}", controller.snapshot().now_playing());
//!     controller.shutdown().await;
//! }
//! ```

pub mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod focus;
pub mod navigation;
mod position;
pub mod state;
pub mod types;

pub use controller::PlaybackController;
pub use engine::{AudioEngine, EngineSession, SessionEvents};
pub use error::{EngineError, PlaybackError, Result};
pub use events::ControllerEvent;
pub use focus::{AudioFocus, FocusChange, FocusEvents, FocusRequest};
pub use state::PlaybackSnapshot;
pub use types::{ControllerConfig, LoopMode, TrackState};

//! Cadence command-line player
//!
//! Runs the playback controller against a scanned directory with a
//! clock-driven engine and an in-process focus arbiter, so the whole
//! transport can be exercised from a terminal without audio hardware.

pub mod config;
pub mod engine;
pub mod error;
pub mod focus;
pub mod player;
pub mod shell;

pub use config::CadenceConfig;
pub use engine::SimulatedEngine;
pub use error::{CliError, Result};
pub use focus::{FocusClient, LocalFocusArbiter};
pub use player::{directory_catalog, Player};

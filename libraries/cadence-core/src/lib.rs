//! Cadence Core
//!
//! Platform-agnostic domain types, traits, and error handling for Cadence.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Genre`, `Artwork` and their identifiers
//! - **Core Traits**: `TrackCatalog`, the source of track records and artwork bytes
//! - **Error Handling**: Unified `CadenceError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{Track, TrackId};
//!
//! let track = Track::new(TrackId::new(1), "Intro", "/music/intro.flac")
//!     .with_artist(7, "The Band")
//!     .with_album("First Light")
//!     .with_duration_ms(185_000);
//!
//! assert_eq!(track.artist_name, "The Band");
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{CadenceError, Result};
pub use traits::TrackCatalog;
pub use types::{ArtistId, Artwork, ArtworkSlot, Genre, GenreId, Track, TrackId};

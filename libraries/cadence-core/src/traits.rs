/// Core traits for Cadence
use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Artwork, Track};

/// Source of track records and artwork bytes
///
/// Implementers enumerate whatever media store the device offers. Enumeration
/// is a snapshot: callers re-enumerate to observe changes.
#[async_trait]
pub trait TrackCatalog: Send + Sync {
    /// Enumerate every playable track currently available
    ///
    /// # Errors
    /// Returns an error if the underlying media store cannot be read
    async fn enumerate(&self) -> Result<Vec<Track>>;

    /// Fetch the raw artwork stored under `locator`
    ///
    /// # Errors
    /// Returns `CadenceError::NotFound` when the locator has no artwork, or
    /// an I/O error when it cannot be read
    async fn fetch_artwork(&self, locator: &str) -> Result<Artwork>;
}

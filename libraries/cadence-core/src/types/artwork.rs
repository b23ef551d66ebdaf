//! Artwork bytes and the per-track cache slot

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Raw artwork image as fetched from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    /// Encoded image bytes
    pub data: Vec<u8>,
    /// MIME type, e.g. `image/jpeg`
    pub mime_type: String,
}

impl Artwork {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Size of the encoded image in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Lazily filled artwork cache attached to a track
///
/// Clones share the slot, so artwork loaded through one copy of a track is
/// visible through every other copy of the same in-memory record. The slot is
/// filled at most once and is ignored by equality and serialization.
#[derive(Clone, Default)]
pub struct ArtworkSlot(Arc<OnceLock<Artwork>>);

impl ArtworkSlot {
    /// Cached artwork, if it has been loaded
    pub fn get(&self) -> Option<&Artwork> {
        self.0.get()
    }

    /// Store artwork if the slot is still empty, returning the cached value
    pub fn fill(&self, artwork: Artwork) -> &Artwork {
        self.0.get_or_init(|| artwork)
    }

    pub fn is_filled(&self) -> bool {
        self.0.get().is_some()
    }
}

impl PartialEq for ArtworkSlot {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ArtworkSlot {}

impl fmt::Debug for ArtworkSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get() {
            Some(art) => write!(f, "ArtworkSlot({} bytes, {})", art.len(), art.mime_type),
            None => f.write_str("ArtworkSlot(empty)"),
        }
    }
}

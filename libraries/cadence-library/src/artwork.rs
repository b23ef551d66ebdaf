//! Artwork loading with LRU caching
//!
//! Artwork is decorative: every failure is logged and degrades to "no
//! artwork". Nothing here reports playback errors.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cadence_core::{Artwork, Track, TrackCatalog};
use lru::LruCache;
use tracing::{debug, warn};

use crate::grouping::GroupSummary;

/// Default number of images kept in memory
pub const DEFAULT_CACHE_SIZE: usize = 100;

/// Loads artwork through a catalog and caches it by locator
pub struct ArtworkCache {
    catalog: Arc<dyn TrackCatalog>,
    cache: Mutex<LruCache<String, Artwork>>,
}

impl ArtworkCache {
    /// Create a cache holding up to `capacity` images (at least one)
    pub fn new(catalog: Arc<dyn TrackCatalog>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            catalog,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Artwork stored under `locator`, fetched on a cache miss
    pub async fn load(&self, locator: &str) -> Option<Artwork> {
        let cached = self.lock().get(locator).cloned();
        if cached.is_some() {
            return cached;
        }

        match self.catalog.fetch_artwork(locator).await {
            Ok(artwork) => {
                self.lock().put(locator.to_string(), artwork.clone());
                Some(artwork)
            }
            Err(e) if e.is_not_found() => {
                debug!(locator, "No artwork available");
                None
            }
            Err(e) => {
                warn!(locator, error = %e, "Failed to load artwork");
                None
            }
        }
    }

    /// Artwork for `track`, filling the track's own slot on first load
    pub async fn load_for_track(&self, track: &Track) -> Option<Artwork> {
        if let Some(artwork) = track.artwork() {
            return Some(artwork.clone());
        }
        let locator = track.artwork_locator.as_deref()?;
        let artwork = self.load(locator).await?;
        Some(track.artwork_slot().fill(artwork).clone())
    }

    pub async fn load_for_group(&self, group: &GroupSummary) -> Option<Artwork> {
        let locator = group.artwork_locator.as_deref()?;
        self.load(locator).await
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Artwork>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

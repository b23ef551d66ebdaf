//! In-memory catalog snapshot with case-insensitive queries

use std::sync::Arc;

use cadence_core::{Result, Track, TrackCatalog, TrackId};
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

/// Snapshot of a [`TrackCatalog`], refreshed on demand
pub struct LibraryStore {
    catalog: Arc<dyn TrackCatalog>,
    tracks: watch::Sender<Vec<Track>>,
    initialized: Mutex<bool>,
}

impl LibraryStore {
    pub fn new(catalog: Arc<dyn TrackCatalog>) -> Self {
        Self {
            catalog,
            tracks: watch::Sender::new(Vec::new()),
            initialized: Mutex::new(false),
        }
    }

    /// Enumerate the catalog once; later calls are no-ops
    ///
    /// Returns the number of tracks in the snapshot.
    pub async fn initialize(&self) -> Result<usize> {
        let mut initialized = self.initialized.lock().await;
        if !*initialized {
            self.load().await?;
            *initialized = true;
        }
        Ok(self.len())
    }

    /// Re-enumerate the catalog and replace the snapshot
    ///
    /// On failure the previous snapshot is kept.
    pub async fn refresh(&self) -> Result<usize> {
        let mut initialized = self.initialized.lock().await;
        self.load().await?;
        *initialized = true;
        Ok(self.len())
    }

    async fn load(&self) -> Result<()> {
        match self.catalog.enumerate().await {
            Ok(tracks) => {
                info!(tracks = tracks.len(), "Catalog loaded");
                self.tracks.send_replace(tracks);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Catalog enumeration failed, keeping previous snapshot");
                Err(e)
            }
        }
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.tracks.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.tracks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.borrow().is_empty()
    }

    /// Receiver notified whenever the snapshot is replaced
    pub fn subscribe(&self) -> watch::Receiver<Vec<Track>> {
        self.tracks.subscribe()
    }

    pub fn catalog(&self) -> &Arc<dyn TrackCatalog> {
        &self.catalog
    }

    pub fn track(&self, id: TrackId) -> Option<Track> {
        self.tracks.borrow().iter().find(|t| t.id == id).cloned()
    }

    pub fn tracks_by_artist(&self, name: &str) -> Vec<Track> {
        self.matching(name, |t| &t.artist_name)
    }

    pub fn tracks_by_album(&self, name: &str) -> Vec<Track> {
        self.matching(name, |t| &t.album_name)
    }

    pub fn tracks_by_title(&self, name: &str) -> Vec<Track> {
        self.matching(name, |t| &t.title)
    }

    fn matching(&self, name: &str, field: impl Fn(&Track) -> &String) -> Vec<Track> {
        let needle = name.to_lowercase();
        self.tracks
            .borrow()
            .iter()
            .filter(|t| field(t).to_lowercase() == needle)
            .cloned()
            .collect()
    }
}

//! Catalog store, artwork cache and directory catalog

use std::fs;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::{Artwork, CadenceError, Track, TrackCatalog, TrackId};
use cadence_library::{grouping, ArtworkCache, DirectoryCatalog, GroupingMode, LibraryStore};
use tempfile::TempDir;

/// In-memory catalog that counts calls and can be told to fail
struct MemoryCatalog {
    tracks: std::sync::Mutex<Vec<Track>>,
    enumerations: AtomicUsize,
    fetches: AtomicUsize,
    fail: AtomicBool,
}

impl MemoryCatalog {
    fn new(tracks: Vec<Track>) -> Arc<Self> {
        Arc::new(Self {
            tracks: std::sync::Mutex::new(tracks),
            enumerations: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        })
    }

    fn replace(&self, tracks: Vec<Track>) {
        *self.tracks.lock().unwrap() = tracks;
    }
}

#[async_trait]
impl TrackCatalog for MemoryCatalog {
    async fn enumerate(&self) -> cadence_core::Result<Vec<Track>> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CadenceError::catalog("media store unavailable"));
        }
        Ok(self.tracks.lock().unwrap().clone())
    }

    async fn fetch_artwork(&self, locator: &str) -> cadence_core::Result<Artwork> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match locator {
            "art://missing" => Err(CadenceError::not_found("Artwork", locator)),
            "art://broken" => Err(CadenceError::Io(std::io::Error::other("read failed"))),
            _ => Ok(Artwork::new(locator.as_bytes().to_vec(), "image/png")),
        }
    }
}

fn track(id: i64, title: &str, artist: &str, album: &str) -> Track {
    Track::new(TrackId::new(id), title, format!("/m/{id}.mp3"))
        .with_artist(id, artist)
        .with_album(album)
}

fn sample() -> Vec<Track> {
    vec![
        track(1, "Intro", "The Band", "First"),
        track(2, "Outro", "the band", "Second"),
        track(3, "intro", "Solo", "first"),
    ]
}

// ===== LibraryStore =====

#[tokio::test]
async fn initialize_enumerates_once() {
    let catalog = MemoryCatalog::new(sample());
    let store = LibraryStore::new(catalog.clone());

    assert_eq!(store.initialize().await.unwrap(), 3);
    assert_eq!(store.initialize().await.unwrap(), 3);

    assert_eq!(catalog.enumerations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn refresh_replaces_snapshot_and_notifies() {
    let catalog = MemoryCatalog::new(sample());
    let store = LibraryStore::new(catalog.clone());
    store.initialize().await.unwrap();
    let mut rx = store.subscribe();
    rx.borrow_and_update();

    catalog.replace(vec![track(9, "New", "Someone", "Else")]);
    assert_eq!(store.refresh().await.unwrap(), 1);

    assert!(rx.has_changed().unwrap());
    assert_eq!(store.tracks()[0].id, TrackId::new(9));
}

#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot() {
    let catalog = MemoryCatalog::new(sample());
    let store = LibraryStore::new(catalog.clone());
    store.initialize().await.unwrap();

    catalog.fail.store(true, Ordering::SeqCst);
    assert!(store.refresh().await.is_err());

    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn failed_initialize_can_be_retried() {
    let catalog = MemoryCatalog::new(sample());
    catalog.fail.store(true, Ordering::SeqCst);
    let store = LibraryStore::new(catalog.clone());

    assert!(store.initialize().await.is_err());
    assert!(store.is_empty());

    catalog.fail.store(false, Ordering::SeqCst);
    assert_eq!(store.initialize().await.unwrap(), 3);
}

#[tokio::test]
async fn queries_ignore_case() {
    let store = LibraryStore::new(MemoryCatalog::new(sample()));
    store.initialize().await.unwrap();

    assert_eq!(store.tracks_by_artist("THE BAND").len(), 2);
    assert_eq!(store.tracks_by_album("First").len(), 2);
    assert_eq!(store.tracks_by_title("intro").len(), 2);
    assert!(store.tracks_by_title("intr").is_empty());
    assert_eq!(
        store.track(TrackId::new(2)).map(|t| t.title),
        Some("Outro".to_string())
    );
}

// ===== ArtworkCache =====

#[tokio::test]
async fn artwork_is_fetched_once_per_locator() {
    let catalog = MemoryCatalog::new(Vec::new());
    let cache = ArtworkCache::new(catalog.clone(), 4);

    let first = cache.load("art://cover").await.unwrap();
    let second = cache.load("art://cover").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.mime_type, "image/png");
    assert_eq!(catalog.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn artwork_failures_degrade_to_none() {
    let catalog = MemoryCatalog::new(Vec::new());
    let cache = ArtworkCache::new(catalog.clone(), 4);

    assert!(cache.load("art://missing").await.is_none());
    assert!(cache.load("art://broken").await.is_none());
    assert!(cache.is_empty());
}

#[tokio::test]
async fn least_recently_used_artwork_is_evicted() {
    let catalog = MemoryCatalog::new(Vec::new());
    let cache = ArtworkCache::new(catalog.clone(), 2);

    cache.load("art://a").await;
    cache.load("art://b").await;
    cache.load("art://a").await;
    cache.load("art://c").await;
    cache.load("art://a").await;

    assert_eq!(cache.len(), 2);
    assert_eq!(catalog.fetches.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn track_artwork_fills_shared_slot() {
    let catalog = MemoryCatalog::new(Vec::new());
    let cache = ArtworkCache::new(catalog.clone(), 4);
    let track = track(1, "Intro", "Band", "First").with_artwork_locator("art://one");
    let copy = track.clone();

    assert!(cache.load_for_track(&track).await.is_some());

    assert!(copy.artwork().is_some());
    cache.clear();
    assert!(cache.load_for_track(&copy).await.is_some());
    assert_eq!(catalog.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn track_without_locator_has_no_artwork() {
    let catalog = MemoryCatalog::new(Vec::new());
    let cache = ArtworkCache::new(catalog.clone(), 4);
    assert!(cache
        .load_for_track(&track(1, "a", "b", "c"))
        .await
        .is_none());
    assert_eq!(catalog.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn group_artwork_comes_from_first_member() {
    let catalog = MemoryCatalog::new(Vec::new());
    let cache = ArtworkCache::new(catalog.clone(), 4);
    let tracks = vec![
        track(1, "a", "Band", "First").with_artwork_locator("art://first"),
        track(2, "b", "Band", "First").with_artist(1, "Band"),
        track(3, "c", "Solo", "Other"),
    ];
    let data = grouping::summarize(GroupingMode::Artists, &tracks);

    let band = data.groups.iter().find(|g| g.name == "Band").unwrap();
    let solo = data.groups.iter().find(|g| g.name == "Solo").unwrap();

    let art = cache.load_for_group(band).await.unwrap();
    assert_eq!(art.data, b"art://first".to_vec());
    assert!(cache.load_for_group(solo).await.is_none());
}

// ===== DirectoryCatalog =====

fn music_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("b-side")).unwrap();
    fs::write(dir.path().join("zebra.mp3"), b"not really audio").unwrap();
    fs::write(dir.path().join("b-side/apple.FLAC"), b"not really audio").unwrap();
    fs::write(dir.path().join("cover.jpg"), b"image").unwrap();
    fs::write(dir.path().join("notes.txt"), b"text").unwrap();
    dir
}

#[tokio::test]
async fn directory_catalog_lists_supported_files() {
    let dir = music_dir();
    let catalog = DirectoryCatalog::new([dir.path()]);

    let tracks = catalog.enumerate().await.unwrap();

    let titles: Vec<_> = tracks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["apple", "zebra"]);
    assert!(tracks.iter().all(|t| t.artist_name == "Unknown Artist"));
    assert!(tracks.iter().all(|t| t.artwork_locator.is_none()));
}

#[tokio::test]
async fn directory_catalog_ids_are_stable() {
    let dir = music_dir();
    let catalog = DirectoryCatalog::new([dir.path()]);

    let first = catalog.enumerate().await.unwrap();
    let second = catalog.enumerate().await.unwrap();

    let ids = |tracks: &[Track]| tracks.iter().map(|t| t.id).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&second));
    // "b-side/apple.FLAC" sorts before "zebra.mp3".
    assert_eq!(first[0].id, TrackId::new(1));
}

#[tokio::test]
async fn directory_catalog_rejects_missing_root() {
    let catalog = DirectoryCatalog::new(["/definitely/not/here"]);
    assert!(catalog.enumerate().await.is_err());
}

#[tokio::test]
async fn directory_catalog_skips_missing_root_when_others_work() {
    let dir = music_dir();
    let catalog = DirectoryCatalog::new([dir.path(), std::path::Path::new("/definitely/not/here")]);
    assert_eq!(catalog.enumerate().await.unwrap().len(), 2);
}

#[tokio::test]
async fn artwork_of_untagged_file_is_not_found() {
    let dir = music_dir();
    let catalog = DirectoryCatalog::new([dir.path()]);
    let locator = dir.path().join("zebra.mp3");

    let result = catalog.fetch_artwork(&locator.to_string_lossy()).await;

    assert!(result.is_err());
}

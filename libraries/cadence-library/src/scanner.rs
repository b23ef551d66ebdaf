//! Filesystem catalog
//!
//! Walks configured directories for audio files and reads their tags with
//! lofty. Identifiers are derived from the sorted path order, so scanning the
//! same tree twice yields the same ids.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cadence_core::{Artwork, Genre, Track, TrackCatalog, TrackId};
use lofty::{AudioFile, ItemKey, PictureType, TaggedFileExt};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{LibraryError, Result};

/// Supported audio file extensions
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "opus", "wav", "m4a", "aac"];

/// Maximum artwork size (5MB)
const MAX_ARTWORK_SIZE: usize = 5 * 1024 * 1024;

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Track catalog backed by local directories
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    roots: Vec<PathBuf>,
    extensions: Vec<String>,
    follow_links: bool,
}

/// Tags read from one file
#[derive(Debug, Default)]
struct FileTags {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    genre: Option<String>,
    year: Option<u32>,
    track_number: Option<u32>,
    duration_ms: u64,
    has_artwork: bool,
}

impl DirectoryCatalog {
    pub fn new<P: Into<PathBuf>>(roots: impl IntoIterator<Item = P>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            extensions: SUPPORTED_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            follow_links: false,
        }
    }

    /// Restrict scanning to these extensions (case-insensitive, no dot)
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        if !extensions.is_empty() {
            self.extensions = extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect();
        }
        self
    }

    /// Set whether to follow symbolic links
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Scan every root and build the track list, sorted by title
    ///
    /// Roots that cannot be scanned are skipped with a warning; if none can
    /// be scanned the first error is returned.
    pub fn scan(&self) -> Result<Vec<Track>> {
        let files = self.audio_files()?;
        let tagged = files
            .into_iter()
            .map(|path| {
                let tags = read_tags(&path);
                (path, tags)
            })
            .collect();
        Ok(build_tracks(tagged))
    }

    /// Sorted paths of every supported file below the roots
    fn audio_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut first_error = None;
        let mut scanned = 0usize;

        for root in &self.roots {
            match self.scan_directory(root) {
                Ok(mut found) => {
                    scanned += 1;
                    files.append(&mut found);
                }
                Err(e) => {
                    warn!("Failed to scan {}: {}", root.display(), e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if scanned == 0 {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }

    fn scan_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if !path.exists() {
            return Err(LibraryError::FileNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(LibraryError::InvalidPath(format!(
                "{} is not a directory",
                path.display()
            )));
        }

        let walker = WalkDir::new(path).follow_links(self.follow_links);
        let files = walker
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| self.is_supported(path))
            .collect();
        Ok(files)
    }

    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
    }
}

#[async_trait]
impl TrackCatalog for DirectoryCatalog {
    async fn enumerate(&self) -> cadence_core::Result<Vec<Track>> {
        let scanner = self.clone();
        let tracks = tokio::task::spawn_blocking(move || scanner.scan())
            .await
            .map_err(|e| LibraryError::Task(e.to_string()))??;
        Ok(tracks)
    }

    async fn fetch_artwork(&self, locator: &str) -> cadence_core::Result<Artwork> {
        let path = PathBuf::from(locator);
        let artwork = tokio::task::spawn_blocking(move || extract_artwork(&path))
            .await
            .map_err(|e| LibraryError::Task(e.to_string()))??;
        Ok(artwork)
    }
}

/// Read tags from `path`, falling back to empty tags when the file cannot
/// be parsed
fn read_tags(path: &Path) -> FileTags {
    let tagged_file = match lofty::read_from_path(path) {
        Ok(file) => file,
        Err(e) => {
            debug!("Unreadable tags in {}: {}", path.display(), e);
            return FileTags::default();
        }
    };

    let mut tags = FileTags {
        duration_ms: tagged_file.properties().duration().as_millis() as u64,
        ..FileTags::default()
    };

    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
        return tags;
    };

    for item in tag.items() {
        let Some(text) = item.value().text().map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };
        match item.key() {
            ItemKey::TrackTitle => tags.title = Some(text.to_string()),
            ItemKey::TrackArtist => tags.artist = Some(text.to_string()),
            ItemKey::AlbumTitle => tags.album = Some(text.to_string()),
            ItemKey::Genre => tags.genre = Some(text.to_string()),
            ItemKey::Year | ItemKey::RecordingDate => {
                if tags.year.is_none() {
                    tags.year = text.get(..4).and_then(|y| y.parse().ok());
                }
            }
            ItemKey::TrackNumber => {
                tags.track_number = text.split('/').next().and_then(|n| n.trim().parse().ok());
            }
            _ => {}
        }
    }
    tags.has_artwork = !tag.pictures().is_empty();
    tags
}

/// Assign ids in path order and build the final, title-sorted track list
fn build_tracks(files: Vec<(PathBuf, FileTags)>) -> Vec<Track> {
    let mut artist_ids: HashMap<String, i64> = HashMap::new();
    let mut genre_ids: HashMap<String, i64> = HashMap::new();
    let mut tracks = Vec::with_capacity(files.len());

    for (index, (path, tags)) in files.into_iter().enumerate() {
        let locator = path.to_string_lossy().into_owned();
        let title = tags.title.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| locator.clone())
        });
        let artist = tags.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
        let artist_id = next_id(&mut artist_ids, &artist);

        let mut track = Track::new(TrackId::new(index as i64 + 1), title, locator.clone())
            .with_artist(artist_id, artist)
            .with_album(tags.album.unwrap_or_else(|| UNKNOWN_ALBUM.to_string()))
            .with_duration_ms(tags.duration_ms);
        if let Some(year) = tags.year {
            track = track.with_year(year);
        }
        if let Some(number) = tags.track_number {
            track = track.with_track_number(number);
        }
        if let Some(genre) = tags.genre {
            let id = next_id(&mut genre_ids, &genre);
            track = track.with_genre(Genre::new(id, genre));
        }
        if tags.has_artwork {
            track = track.with_artwork_locator(locator);
        }
        tracks.push(track);
    }

    tracks.sort_by_key(|t| t.title.to_lowercase());
    tracks
}

fn next_id(ids: &mut HashMap<String, i64>, name: &str) -> i64 {
    let next = ids.len() as i64 + 1;
    *ids.entry(name.to_lowercase()).or_insert(next)
}

/// Extract the front cover (or first picture) embedded in an audio file
pub fn extract_artwork(path: &Path) -> Result<Artwork> {
    if !path.exists() {
        return Err(LibraryError::FileNotFound(path.to_path_buf()));
    }

    let tagged_file = lofty::read_from_path(path)?;
    let no_artwork = || LibraryError::NoArtwork(path.display().to_string());

    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
        .ok_or_else(no_artwork)?;

    let pictures = tag.pictures();
    let picture = pictures
        .iter()
        .find(|p| matches!(p.pic_type(), PictureType::CoverFront))
        .or_else(|| pictures.first())
        .ok_or_else(no_artwork)?;

    let data = picture.data();
    if data.len() > MAX_ARTWORK_SIZE {
        warn!(
            "Artwork in {} is too large ({} bytes, max {} bytes), skipping",
            path.display(),
            data.len(),
            MAX_ARTWORK_SIZE
        );
        return Err(LibraryError::TooLarge(data.len(), MAX_ARTWORK_SIZE));
    }

    let mime_type = picture
        .mime_type()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "image/jpeg".to_string());

    Ok(Artwork::new(data.to_vec(), mime_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(title: &str, artist: &str, genre: Option<&str>) -> FileTags {
        FileTags {
            title: Some(title.to_string()),
            artist: Some(artist.to_string()),
            genre: genre.map(str::to_string),
            ..FileTags::default()
        }
    }

    #[test]
    fn ids_follow_path_order_and_tracks_sort_by_title() {
        let tracks = build_tracks(vec![
            (PathBuf::from("/m/a.mp3"), tags("Zulu", "Ann", Some("Rock"))),
            (PathBuf::from("/m/b.mp3"), tags("alpha", "Bob", Some("rock"))),
            (PathBuf::from("/m/c.mp3"), tags("Mike", "ann", None)),
        ]);

        let titles: Vec<_> = tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["alpha", "Mike", "Zulu"]);

        let zulu = &tracks[2];
        assert_eq!(zulu.id.get(), 1);
        assert_eq!(zulu.artist_id, 1);
        let mike = &tracks[1];
        assert_eq!(mike.artist_id, 1, "artist ids ignore case");
        let alpha = &tracks[0];
        assert_eq!(alpha.artist_id, 2);
        assert_eq!(alpha.genre.as_ref().map(|g| g.id), zulu.genre.as_ref().map(|g| g.id));
        assert!(mike.genre.is_none());
    }

    #[test]
    fn missing_tags_fall_back_to_defaults() {
        let tracks = build_tracks(vec![(PathBuf::from("/m/untitled.flac"), FileTags::default())]);
        let track = &tracks[0];
        assert_eq!(track.title, "untitled");
        assert_eq!(track.artist_name, UNKNOWN_ARTIST);
        assert_eq!(track.album_name, UNKNOWN_ALBUM);
        assert_eq!(track.locator, "/m/untitled.flac");
        assert!(track.artwork_locator.is_none());
    }

    #[test]
    fn extensions_are_normalized() {
        let catalog = DirectoryCatalog::new(["/m"]).with_extensions(vec![".MP3".into()]);
        assert!(catalog.is_supported(Path::new("/m/a.mp3")));
        assert!(catalog.is_supported(Path::new("/m/A.Mp3")));
        assert!(!catalog.is_supported(Path::new("/m/a.flac")));
        assert!(!catalog.is_supported(Path::new("/m/README")));
    }

    #[test]
    fn extract_nonexistent_file_returns_error() {
        let result = extract_artwork(Path::new("/nonexistent/file.mp3"));
        assert!(matches!(result, Err(LibraryError::FileNotFound(_))));
    }
}

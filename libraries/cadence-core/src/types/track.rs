/// Track domain type
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::artwork::{Artwork, ArtworkSlot};
use super::genre::Genre;
use super::ids::{ArtistId, TrackId};

/// Audio track as enumerated from the device catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Position within its album
    pub track_number: Option<u32>,

    /// Track title
    pub title: String,

    /// Artist identifier
    pub artist_id: ArtistId,

    /// Artist name
    pub artist_name: String,

    /// Album name
    pub album_name: String,

    /// Release year
    pub year: Option<u32>,

    /// Genre, when the media store has one for this track
    pub genre: Option<Genre>,

    /// Track duration in milliseconds
    pub duration_ms: u64,

    /// Path or URI of the audio source
    pub locator: String,

    /// Where the artwork for this track can be fetched from
    pub artwork_locator: Option<String>,

    #[serde(skip)]
    artwork: ArtworkSlot,
}

impl Track {
    /// Create a new track with minimal metadata
    pub fn new(id: TrackId, title: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            id,
            track_number: None,
            title: title.into(),
            artist_id: 0,
            artist_name: String::new(),
            album_name: String::new(),
            year: None,
            genre: None,
            duration_ms: 0,
            locator: locator.into(),
            artwork_locator: None,
            artwork: ArtworkSlot::default(),
        }
    }

    pub fn with_artist(mut self, id: ArtistId, name: impl Into<String>) -> Self {
        self.artist_id = id;
        self.artist_name = name.into();
        self
    }

    pub fn with_album(mut self, name: impl Into<String>) -> Self {
        self.album_name = name.into();
        self
    }

    pub fn with_year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_genre(mut self, genre: Genre) -> Self {
        self.genre = Some(genre);
        self
    }

    pub fn with_track_number(mut self, number: u32) -> Self {
        self.track_number = Some(number);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_artwork_locator(mut self, locator: impl Into<String>) -> Self {
        self.artwork_locator = Some(locator.into());
        self
    }

    /// Get the track duration as a Duration
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Artwork loaded for this in-memory record, if any
    pub fn artwork(&self) -> Option<&Artwork> {
        self.artwork.get()
    }

    /// Cache slot shared by every clone of this record
    pub fn artwork_slot(&self) -> &ArtworkSlot {
        &self.artwork
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Track {
        Track::new(TrackId::new(3), "Song", "/music/song.mp3")
            .with_artist(2, "Artist")
            .with_album("Album")
            .with_year(1999)
            .with_genre(Genre::new(5, "Jazz"))
            .with_duration_ms(61_500)
    }

    #[test]
    fn builder_sets_fields() {
        let track = sample();
        assert_eq!(track.artist_id, 2);
        assert_eq!(track.year, Some(1999));
        assert_eq!(track.genre.as_ref().map(|g| g.name.as_str()), Some("Jazz"));
        assert_eq!(track.duration(), Duration::from_millis(61_500));
    }

    #[test]
    fn artwork_survives_clone_but_not_serialization() {
        let track = sample();
        let copy = track.clone();
        track
            .artwork_slot()
            .fill(Artwork::new(vec![0xFF, 0xD8], "image/jpeg"));
        assert!(copy.artwork().is_some());

        let json = serde_json::to_string(&copy).unwrap();
        assert!(!json.contains("artwork\""));
        let back: Track = serde_json::from_str(&json).unwrap();
        assert!(back.artwork().is_none());
        assert_eq!(back, track);
    }
}

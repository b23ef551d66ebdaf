//! Track ordering for playlist views

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use cadence_core::Track;
use serde::{Deserialize, Serialize};

/// Sort order applied to a track list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackOrder {
    /// Keep catalog order
    #[default]
    None,
    TitleAsc,
    TitleDesc,
    ArtistAsc,
    ArtistDesc,
    DurationAsc,
    DurationDesc,
    GenreAsc,
    GenreDesc,
    TrackNumberAsc,
    TrackNumberDesc,
}

impl TrackOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::TitleAsc => "title",
            Self::TitleDesc => "title-desc",
            Self::ArtistAsc => "artist",
            Self::ArtistDesc => "artist-desc",
            Self::DurationAsc => "duration",
            Self::DurationDesc => "duration-desc",
            Self::GenreAsc => "genre",
            Self::GenreDesc => "genre-desc",
            Self::TrackNumberAsc => "track-number",
            Self::TrackNumberDesc => "track-number-desc",
        }
    }
}

impl fmt::Display for TrackOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let order = match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "none" => Self::None,
            "title" | "title-asc" => Self::TitleAsc,
            "title-desc" => Self::TitleDesc,
            "artist" | "artist-asc" => Self::ArtistAsc,
            "artist-desc" => Self::ArtistDesc,
            "duration" | "duration-asc" => Self::DurationAsc,
            "duration-desc" => Self::DurationDesc,
            "genre" | "genre-asc" => Self::GenreAsc,
            "genre-desc" => Self::GenreDesc,
            "track-number" | "track-number-asc" => Self::TrackNumberAsc,
            "track-number-desc" => Self::TrackNumberDesc,
            other => return Err(format!("unknown track order '{other}'")),
        };
        Ok(order)
    }
}

/// Sort `tracks` in place
///
/// The sort is stable. Text keys compare case-insensitively. Tracks missing
/// the key (no genre, no track number) sort last when ascending and first
/// when descending.
pub fn sort_tracks(tracks: &mut [Track], order: TrackOrder) {
    match order {
        TrackOrder::None => {}
        TrackOrder::TitleAsc => tracks.sort_by(|a, b| by_text(&a.title, &b.title)),
        TrackOrder::TitleDesc => tracks.sort_by(|a, b| by_text(&b.title, &a.title)),
        TrackOrder::ArtistAsc => tracks.sort_by(|a, b| by_text(&a.artist_name, &b.artist_name)),
        TrackOrder::ArtistDesc => tracks.sort_by(|a, b| by_text(&b.artist_name, &a.artist_name)),
        TrackOrder::DurationAsc => tracks.sort_by_key(|t| t.duration_ms),
        TrackOrder::DurationDesc => tracks.sort_by(|a, b| b.duration_ms.cmp(&a.duration_ms)),
        TrackOrder::GenreAsc => tracks.sort_by(|a, b| missing_last(genre(a), genre(b))),
        TrackOrder::GenreDesc => tracks.sort_by(|a, b| missing_last(genre(a), genre(b)).reverse()),
        TrackOrder::TrackNumberAsc => {
            tracks.sort_by(|a, b| missing_last(a.track_number, b.track_number));
        }
        TrackOrder::TrackNumberDesc => {
            tracks.sort_by(|a, b| missing_last(a.track_number, b.track_number).reverse());
        }
    }
}

/// Sorted copy of `tracks`
pub fn sorted(tracks: &[Track], order: TrackOrder) -> Vec<Track> {
    let mut tracks = tracks.to_vec();
    sort_tracks(&mut tracks, order);
    tracks
}

fn by_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn genre(track: &Track) -> Option<String> {
    track.genre.as_ref().map(|g| g.name.to_lowercase())
}

fn missing_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

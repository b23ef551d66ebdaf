//! Grouping of catalog tracks into browsable collections

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use cadence_core::Track;
use serde::{Deserialize, Serialize};

/// Key shared by tracks without a release year
pub const UNKNOWN_YEAR_KEY: &str = "unknown";

const UNKNOWN_YEAR_NAME: &str = "Unknown";

/// How the catalog is grouped for browsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    /// No grouping: every track is listed
    #[default]
    AllTracks,
    Artists,
    Albums,
    Years,
    Genres,
}

impl GroupingMode {
    pub const ALL: [GroupingMode; 5] = [
        GroupingMode::AllTracks,
        GroupingMode::Artists,
        GroupingMode::Albums,
        GroupingMode::Years,
        GroupingMode::Genres,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllTracks => "tracks",
            Self::Artists => "artists",
            Self::Albums => "albums",
            Self::Years => "years",
            Self::Genres => "genres",
        }
    }
}

impl fmt::Display for GroupingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tracks" | "all" | "all_tracks" => Ok(Self::AllTracks),
            "artists" | "artist" => Ok(Self::Artists),
            "albums" | "album" => Ok(Self::Albums),
            "years" | "year" => Ok(Self::Years),
            "genres" | "genre" => Ok(Self::Genres),
            other => Err(format!(
                "unknown grouping mode '{other}' (expected tracks, artists, albums, years or genres)"
            )),
        }
    }
}

/// One browsable group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Stable key used to select the group
    pub key: String,
    /// Display name
    pub name: String,
    /// Artwork of the group's first member
    pub artwork_locator: Option<String>,
    pub track_count: usize,
}

/// Derived browse data for one grouping mode
///
/// `AllTracks` lists the catalog directly and has no groups; every other
/// mode lists groups and leaves `tracks` empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupData {
    pub mode: GroupingMode,
    pub groups: Vec<GroupSummary>,
    pub tracks: Vec<Track>,
}

/// Album key: albums are only equal when both artist and name match
pub fn album_key(track: &Track) -> String {
    format!("{}-{}", track.artist_id, track.album_name)
}

/// Key of the group `track` belongs to under `mode`
///
/// `None` for `AllTracks`, and for genre grouping of tracks without genre
/// metadata.
pub fn group_key(mode: GroupingMode, track: &Track) -> Option<String> {
    match mode {
        GroupingMode::AllTracks => None,
        GroupingMode::Artists => Some(track.artist_id.to_string()),
        GroupingMode::Albums => Some(album_key(track)),
        GroupingMode::Years => Some(
            track
                .year
                .map_or_else(|| UNKNOWN_YEAR_KEY.to_string(), |year| year.to_string()),
        ),
        GroupingMode::Genres => track.genre.as_ref().map(|genre| genre.id.to_string()),
    }
}

fn group_name(mode: GroupingMode, track: &Track) -> String {
    match mode {
        GroupingMode::AllTracks => String::new(),
        GroupingMode::Artists => track.artist_name.clone(),
        GroupingMode::Albums => track.album_name.clone(),
        GroupingMode::Years => track
            .year
            .map_or_else(|| UNKNOWN_YEAR_NAME.to_string(), |year| year.to_string()),
        GroupingMode::Genres => track
            .genre
            .as_ref()
            .map(|genre| genre.name.clone())
            .unwrap_or_default(),
    }
}

/// Compute the browse data for `mode` over the full catalog
pub fn summarize(mode: GroupingMode, tracks: &[Track]) -> GroupData {
    if mode == GroupingMode::AllTracks {
        return GroupData {
            mode,
            groups: Vec::new(),
            tracks: tracks.to_vec(),
        };
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<GroupSummary> = Vec::new();
    for track in tracks {
        let Some(key) = group_key(mode, track) else {
            continue;
        };
        match index.entry(key) {
            Entry::Occupied(slot) => groups[*slot.get()].track_count += 1,
            Entry::Vacant(slot) => {
                groups.push(GroupSummary {
                    key: slot.key().clone(),
                    name: group_name(mode, track),
                    artwork_locator: track.artwork_locator.clone(),
                    track_count: 1,
                });
                slot.insert(groups.len() - 1);
            }
        }
    }
    groups.sort_by(|a, b| a.name.cmp(&b.name));

    GroupData {
        mode,
        groups,
        tracks: Vec::new(),
    }
}

/// Members of the group `key`, ordered by the mode's sort key
///
/// `AllTracks` ignores the key and returns the catalog unchanged.
pub fn tracks_in_group(mode: GroupingMode, key: &str, tracks: &[Track]) -> Vec<Track> {
    if mode == GroupingMode::AllTracks {
        return tracks.to_vec();
    }

    let mut members: Vec<Track> = tracks
        .iter()
        .filter(|track| group_key(mode, track).as_deref() == Some(key))
        .cloned()
        .collect();
    members.sort_by(|a, b| compare_for_group(mode, a, b));
    members
}

fn compare_for_group(mode: GroupingMode, a: &Track, b: &Track) -> Ordering {
    match mode {
        GroupingMode::AllTracks => Ordering::Equal,
        GroupingMode::Artists => a.artist_name.cmp(&b.artist_name),
        GroupingMode::Albums => a.album_name.cmp(&b.album_name),
        GroupingMode::Years => a.year.cmp(&b.year),
        GroupingMode::Genres => {
            let name = |t: &Track| t.genre.as_ref().map(|g| g.name.clone());
            name(a).cmp(&name(b))
        }
    }
}

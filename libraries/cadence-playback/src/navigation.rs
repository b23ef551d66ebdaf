//! Playlist navigation by track identity
//!
//! The current track is tracked by id, never by index, so a playlist can be
//! replaced while a track is bound without the controller losing its place.

use cadence_core::{Track, TrackId};

/// Index of the first entry with `id`
pub fn position_of(playlist: &[Track], id: TrackId) -> Option<usize> {
    playlist.iter().position(|track| track.id == id)
}

/// Track after `current`, wrapping from the last entry to the first
///
/// A `current` missing from the playlist is followed by the first entry.
pub fn following(playlist: &[Track], current: TrackId) -> Option<&Track> {
    if playlist.is_empty() {
        return None;
    }
    let next = match position_of(playlist, current) {
        Some(index) => (index + 1) % playlist.len(),
        None => 0,
    };
    playlist.get(next)
}

/// Track before `current`, wrapping from the first entry to the last
///
/// A `current` missing from the playlist is preceded by the last entry.
pub fn preceding(playlist: &[Track], current: TrackId) -> Option<&Track> {
    let last = playlist.len().checked_sub(1)?;
    let previous = match position_of(playlist, current) {
        Some(0) | None => last,
        Some(index) => index - 1,
    };
    playlist.get(previous)
}

/// Track after `current` without wrapping
///
/// `None` when `current` is the last entry or is not in the playlist.
pub fn following_in_order(playlist: &[Track], current: TrackId) -> Option<&Track> {
    let index = position_of(playlist, current)?;
    playlist.get(index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(ids: &[i64]) -> Vec<Track> {
        ids.iter()
            .map(|&id| Track::new(TrackId::new(id), format!("Track {id}"), format!("/m/{id}.mp3")))
            .collect()
    }

    #[test]
    fn following_wraps_to_first() {
        let tracks = playlist(&[1, 2, 3]);
        assert_eq!(following(&tracks, TrackId::new(1)).map(|t| t.id.get()), Some(2));
        assert_eq!(following(&tracks, TrackId::new(3)).map(|t| t.id.get()), Some(1));
    }

    #[test]
    fn preceding_wraps_to_last() {
        let tracks = playlist(&[1, 2, 3]);
        assert_eq!(preceding(&tracks, TrackId::new(1)).map(|t| t.id.get()), Some(3));
        assert_eq!(preceding(&tracks, TrackId::new(3)).map(|t| t.id.get()), Some(2));
    }

    #[test]
    fn unknown_track_falls_back_to_ends() {
        let tracks = playlist(&[1, 2, 3]);
        assert_eq!(following(&tracks, TrackId::new(9)).map(|t| t.id.get()), Some(1));
        assert_eq!(preceding(&tracks, TrackId::new(9)).map(|t| t.id.get()), Some(3));
        assert!(following_in_order(&tracks, TrackId::new(9)).is_none());
    }

    #[test]
    fn empty_playlist_has_no_neighbours() {
        assert!(following(&[], TrackId::new(1)).is_none());
        assert!(preceding(&[], TrackId::new(1)).is_none());
    }

    #[test]
    fn single_track_is_its_own_neighbour() {
        let tracks = playlist(&[5]);
        assert_eq!(following(&tracks, TrackId::new(5)).map(|t| t.id.get()), Some(5));
        assert_eq!(preceding(&tracks, TrackId::new(5)).map(|t| t.id.get()), Some(5));
        assert!(following_in_order(&tracks, TrackId::new(5)).is_none());
    }

    #[test]
    fn in_order_stops_at_last() {
        let tracks = playlist(&[1, 2]);
        assert_eq!(
            following_in_order(&tracks, TrackId::new(1)).map(|t| t.id.get()),
            Some(2)
        );
        assert!(following_in_order(&tracks, TrackId::new(2)).is_none());
    }
}

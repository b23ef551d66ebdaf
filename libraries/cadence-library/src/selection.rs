//! Playlist and group selection
//!
//! [`SelectionManager`] holds the browse state a presentation layer renders:
//! the grouping mode, the groups derived from the catalog, the playlist the
//! user picked and the highlighted track. Every piece is published through a
//! `tokio::sync::watch` channel so views can react to changes.

use std::sync::Arc;

use cadence_core::Track;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::grouping::{self, GroupData, GroupingMode};

/// Which list the browser shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// Groups for the current mode
    #[default]
    GroupList,
    /// Tracks of the selected group
    Playlist,
}

/// Browse state derived from the catalog
pub struct SelectionManager {
    catalog: watch::Sender<Vec<Track>>,
    mode: watch::Sender<GroupingMode>,
    groups: watch::Sender<GroupData>,
    playlist: watch::Sender<Vec<Track>>,
    selected_track: watch::Sender<Option<Track>>,
    view: watch::Sender<ViewState>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self {
            catalog: watch::Sender::new(Vec::new()),
            mode: watch::Sender::new(GroupingMode::default()),
            groups: watch::Sender::new(GroupData::default()),
            playlist: watch::Sender::new(Vec::new()),
            selected_track: watch::Sender::new(None),
            view: watch::Sender::new(ViewState::default()),
        }
    }

    /// Replace the catalog snapshot and recompute the groups
    ///
    /// An empty selected playlist is seeded with the whole catalog.
    pub fn set_catalog(&self, tracks: Vec<Track>) {
        debug!(tracks = tracks.len(), "Catalog updated");
        self.catalog.send_replace(tracks);
        self.playlist.send_if_modified(|playlist| {
            if playlist.is_empty() {
                playlist.clone_from(&self.catalog.borrow());
                !playlist.is_empty()
            } else {
                false
            }
        });
        self.recompute_groups();
    }

    /// Switch the grouping mode and recompute the groups
    pub fn select_grouping_mode(&self, mode: GroupingMode) {
        self.mode.send_replace(mode);
        self.recompute_groups();
    }

    /// Make the members of group `key` the selected playlist
    pub fn select_group(&self, mode: GroupingMode, key: &str) {
        let members = grouping::tracks_in_group(mode, key, &self.catalog.borrow());
        debug!(%mode, key, tracks = members.len(), "Group selected");
        self.playlist.send_replace(members);
        self.view.send_replace(ViewState::Playlist);
    }

    pub fn select_track(&self, track: Option<Track>) {
        self.selected_track.send_replace(track);
    }

    /// Return to the group list and empty the selected playlist
    pub fn clear_group_selection(&self) {
        self.view.send_replace(ViewState::GroupList);
        self.playlist.send_replace(Vec::new());
    }

    pub fn set_view(&self, view: ViewState) {
        self.view.send_replace(view);
    }

    /// Keep the catalog in sync with `source` until it closes
    pub fn follow(self: Arc<Self>, mut source: watch::Receiver<Vec<Track>>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let tracks = source.borrow_and_update().clone();
                self.set_catalog(tracks);
                if source.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    // ===== Current values =====

    pub fn mode(&self) -> GroupingMode {
        *self.mode.borrow()
    }

    pub fn groups(&self) -> GroupData {
        self.groups.borrow().clone()
    }

    pub fn playlist(&self) -> Vec<Track> {
        self.playlist.borrow().clone()
    }

    pub fn selected_track(&self) -> Option<Track> {
        self.selected_track.borrow().clone()
    }

    pub fn view(&self) -> ViewState {
        *self.view.borrow()
    }

    pub fn catalog(&self) -> Vec<Track> {
        self.catalog.borrow().clone()
    }

    // ===== Subscriptions =====

    pub fn watch_groups(&self) -> watch::Receiver<GroupData> {
        self.groups.subscribe()
    }

    pub fn watch_playlist(&self) -> watch::Receiver<Vec<Track>> {
        self.playlist.subscribe()
    }

    pub fn watch_selected_track(&self) -> watch::Receiver<Option<Track>> {
        self.selected_track.subscribe()
    }

    pub fn watch_view(&self) -> watch::Receiver<ViewState> {
        self.view.subscribe()
    }

    fn recompute_groups(&self) {
        let data = grouping::summarize(self.mode(), &self.catalog.borrow());
        self.groups.send_replace(data);
    }
}

impl Default for SelectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::TrackId;

    fn track(id: i64, artist: i64, album: &str) -> Track {
        Track::new(TrackId::new(id), format!("Song {id}"), format!("/m/{id}.mp3"))
            .with_artist(artist, format!("Artist {artist}"))
            .with_album(album)
    }

    fn catalog() -> Vec<Track> {
        vec![
            track(1, 1, "Blue"),
            track(2, 2, "Red"),
            track(3, 1, "Blue"),
            track(4, 1, "Green"),
        ]
    }

    fn ids(tracks: &[Track]) -> Vec<i64> {
        tracks.iter().map(|t| t.id.get()).collect()
    }

    #[test]
    fn catalog_seeds_empty_playlist() {
        let manager = SelectionManager::new();
        manager.set_catalog(catalog());
        assert_eq!(ids(&manager.playlist()), vec![1, 2, 3, 4]);
        assert_eq!(manager.groups().tracks.len(), 4);
    }

    #[test]
    fn catalog_refresh_keeps_selected_playlist() {
        let manager = SelectionManager::new();
        manager.set_catalog(catalog());
        manager.select_group(GroupingMode::Artists, "2");

        manager.set_catalog(vec![track(9, 3, "New")]);

        assert_eq!(ids(&manager.playlist()), vec![2]);
    }

    #[test]
    fn mode_change_recomputes_groups() {
        let manager = SelectionManager::new();
        manager.set_catalog(catalog());

        manager.select_grouping_mode(GroupingMode::Albums);

        let groups = manager.groups();
        assert_eq!(groups.mode, GroupingMode::Albums);
        let names: Vec<_> = groups.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Blue", "Green", "Red"]);
        assert!(groups.tracks.is_empty());
    }

    #[test]
    fn selecting_group_switches_to_playlist_view() {
        let manager = SelectionManager::new();
        manager.set_catalog(catalog());
        manager.select_grouping_mode(GroupingMode::Albums);

        manager.select_group(GroupingMode::Albums, "1-Blue");

        assert_eq!(manager.view(), ViewState::Playlist);
        assert_eq!(ids(&manager.playlist()), vec![1, 3]);
    }

    #[test]
    fn clearing_selection_returns_to_groups() {
        let manager = SelectionManager::new();
        manager.set_catalog(catalog());
        manager.select_group(GroupingMode::Artists, "1");

        manager.clear_group_selection();

        assert_eq!(manager.view(), ViewState::GroupList);
        assert!(manager.playlist().is_empty());

        // The next catalog snapshot seeds the playlist again.
        manager.set_catalog(catalog());
        assert_eq!(manager.playlist().len(), 4);
    }

    #[test]
    fn unknown_group_yields_empty_playlist() {
        let manager = SelectionManager::new();
        manager.set_catalog(catalog());
        manager.select_group(GroupingMode::Genres, "42");
        assert!(manager.playlist().is_empty());
        assert_eq!(manager.view(), ViewState::Playlist);
    }

    #[test]
    fn selected_track_is_published() {
        let manager = SelectionManager::new();
        let mut rx = manager.watch_selected_track();
        manager.select_track(Some(track(7, 1, "X")));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().map(|t| t.id.get()), Some(7));
    }

    #[tokio::test]
    async fn follow_tracks_catalog_source() {
        let manager = Arc::new(SelectionManager::new());
        let (tx, rx) = watch::channel(Vec::new());
        let mut groups = manager.watch_groups();
        let handle = Arc::clone(&manager).follow(rx);

        tx.send_replace(catalog());
        while groups.borrow_and_update().tracks.len() != 4 {
            groups.changed().await.unwrap();
        }
        assert_eq!(manager.catalog().len(), 4);

        drop(tx);
        handle.await.unwrap();
    }
}

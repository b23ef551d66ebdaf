//! Library, selection and controller wired together for the shell

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use cadence_library::{
    ArtworkCache, DirectoryCatalog, GroupingMode, LibraryStore, SelectionManager,
};
use cadence_playback::PlaybackController;
use tracing::{debug, info};

use crate::config::CadenceConfig;
use crate::engine::SimulatedEngine;
use crate::error::{CliError, Result};
use crate::focus::LocalFocusArbiter;
use crate::shell::{status_line, track_line, ShellCommand, HELP};

/// Filesystem catalog for `roots` honoring the configured extensions
pub fn directory_catalog(config: &CadenceConfig, roots: Vec<PathBuf>) -> DirectoryCatalog {
    let catalog = DirectoryCatalog::new(roots).follow_links(config.library.follow_links);
    if config.library.extensions.is_empty() {
        catalog
    } else {
        catalog.with_extensions(config.library.extensions.clone())
    }
}

/// Push every selected playlist into the controller
fn sync_playlist(selection: &SelectionManager, controller: PlaybackController) {
    let mut playlist = selection.watch_playlist();
    tokio::spawn(async move {
        while playlist.changed().await.is_ok() {
            let tracks = playlist.borrow_and_update().clone();
            debug!(tracks = tracks.len(), "Selected playlist changed");
            controller.set_playlist(tracks).await;
        }
    });
}

/// Everything the shell drives
pub struct Player {
    controller: PlaybackController,
    selection: Arc<SelectionManager>,
    store: Arc<LibraryStore>,
    artwork: ArtworkCache,
    arbiter: LocalFocusArbiter,
}

impl Player {
    pub fn new(
        controller: PlaybackController,
        selection: Arc<SelectionManager>,
        store: Arc<LibraryStore>,
        artwork: ArtworkCache,
        arbiter: LocalFocusArbiter,
    ) -> Self {
        Self {
            controller,
            selection,
            store,
            artwork,
            arbiter,
        }
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn selection(&self) -> &Arc<SelectionManager> {
        &self.selection
    }

    pub fn arbiter(&self) -> &LocalFocusArbiter {
        &self.arbiter
    }

    /// Scan `roots`, select `group` under `mode` and start a controller
    /// playing through the simulated engine
    pub async fn open(
        config: &CadenceConfig,
        roots: Vec<PathBuf>,
        mode: GroupingMode,
        group: Option<&str>,
    ) -> Result<Self> {
        let catalog = Arc::new(directory_catalog(config, roots));
        let store = Arc::new(LibraryStore::new(catalog.clone()));
        let count = store.initialize().await?;
        info!(tracks = count, "Library ready");

        let selection = Arc::new(SelectionManager::new());
        selection.set_catalog(store.tracks());
        selection.select_grouping_mode(mode);
        if let Some(key) = group {
            if !selection.groups().groups.iter().any(|g| g.key == key) {
                return Err(CliError::UnknownGroup(key.to_string()));
            }
            selection.select_group(mode, key);
        }
        Arc::clone(&selection).follow(store.subscribe());

        let arbiter = LocalFocusArbiter::new();
        let controller = PlaybackController::spawn(
            Arc::new(SimulatedEngine::new(config.playback.simulation_speed)),
            Arc::new(arbiter.client()),
            config.controller_config(),
        );
        controller.set_playlist(selection.playlist()).await;
        sync_playlist(&selection, controller.clone());

        let artwork = ArtworkCache::new(catalog, config.library.artwork_cache_size);
        Ok(Self::new(controller, selection, store, artwork, arbiter))
    }

    /// Apply one command; returns the text to show
    pub async fn execute(&self, command: ShellCommand, position_ms: u64) -> String {
        debug!(?command, "Shell command");
        match command {
            ShellCommand::Play => {
                self.controller.play(None).await;
                self.describe(position_ms)
            }
            ShellCommand::Pause => {
                self.controller.pause().await;
                self.describe(position_ms)
            }
            ShellCommand::Stop => {
                self.controller.stop().await;
                self.describe(0)
            }
            ShellCommand::Next => {
                self.controller.skip_next().await;
                self.describe(0)
            }
            ShellCommand::Previous => {
                self.controller.skip_previous().await;
                self.describe(0)
            }
            ShellCommand::Seek(ms) => {
                self.controller.seek(ms).await;
                self.describe(ms)
            }
            ShellCommand::Loop => {
                self.controller.cycle_loop().await;
                format!("loop: {:?}", self.controller.snapshot().loop_mode)
            }
            ShellCommand::List => self.list(),
            ShellCommand::Select(n) => self.select(n).await,
            ShellCommand::Status => self.describe(position_ms),
            ShellCommand::Artwork => self.artwork().await,
            ShellCommand::Rescan => match self.store.refresh().await {
                Ok(count) => format!("library: {count} tracks"),
                Err(e) => format!("rescan failed: {e}"),
            },
            ShellCommand::Focus(change) => {
                if self.arbiter.interrupt(change) {
                    self.controller.flush().await;
                    self.describe(position_ms)
                } else {
                    "nobody holds audio focus".to_string()
                }
            }
            ShellCommand::Help => HELP.to_string(),
            ShellCommand::Quit => "bye".to_string(),
        }
    }

    async fn select(&self, n: usize) -> String {
        let playlist = self.selection.playlist();
        let Some(track) = n.checked_sub(1).and_then(|i| playlist.get(i)).cloned() else {
            return format!("no entry {n} (playlist has {})", playlist.len());
        };
        let line = format!("selected: {}", track_line(&track));
        self.selection.select_track(Some(track.clone()));
        self.controller.select_track(Some(track)).await;
        line
    }

    fn list(&self) -> String {
        let playlist = self.selection.playlist();
        if playlist.is_empty() {
            return "playlist is empty".to_string();
        }
        let current = self.controller.snapshot().current_track.map(|t| t.id);
        let mut out = String::new();
        for (i, track) in playlist.iter().enumerate() {
            let marker = if Some(track.id) == current { '>' } else { ' ' };
            let _ = writeln!(out, "{marker}{:>4}  {}", i + 1, track_line(track));
        }
        out.truncate(out.trim_end().len());
        out
    }

    async fn artwork(&self) -> String {
        let Some(track) = self.controller.snapshot().current_track else {
            return "nothing playing".to_string();
        };
        match self.artwork.load_for_track(&track).await {
            Some(art) => format!("artwork: {}, {} bytes", art.mime_type, art.len()),
            None => "no artwork".to_string(),
        }
    }

    fn describe(&self, position_ms: u64) -> String {
        status_line(&self.controller.snapshot(), position_ms)
    }
}

//! Cadence Library - catalog, grouping and selection
//!
//! This crate turns a [`TrackCatalog`](cadence_core::TrackCatalog) into
//! something a user can browse:
//!
//! - [`LibraryStore`]: cached catalog snapshot with refresh and
//!   case-insensitive lookups
//! - [`grouping`]: group summaries by artist, album, year or genre
//! - [`SelectionManager`]: grouping mode, selected playlist, highlighted
//!   track and view state, published through watch channels
//! - [`ordering`]: sort orders for track lists
//! - [`ArtworkCache`]: LRU cache in front of artwork fetching
//! - [`DirectoryCatalog`]: a catalog that scans local directories
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cadence_library::{DirectoryCatalog, GroupingMode, LibraryStore, SelectionManager};
//!
//! # async fn run() -> cadence_core::Result<()> {
//! let store = LibraryStore::new(Arc::new(DirectoryCatalog::new(["/music"])));
//! store.initialize().await?;
//!
//! let selection = SelectionManager::new();
//! selection.set_catalog(store.tracks());
//! selection.select_grouping_mode(GroupingMode::Albums);
//!
//! for group in selection.groups().groups {
//!     println!("{} ({} tracks)", group.name, group.track_count);
//! }
//! # Ok(())
//! # }
//! ```

mod artwork;
mod error;
pub mod grouping;
pub mod ordering;
mod scanner;
mod selection;
mod store;
mod time;

pub use artwork::{ArtworkCache, DEFAULT_CACHE_SIZE};
pub use error::{LibraryError, Result};
pub use grouping::{GroupData, GroupSummary, GroupingMode};
pub use ordering::{sort_tracks, TrackOrder};
pub use scanner::{extract_artwork, DirectoryCatalog, SUPPORTED_EXTENSIONS};
pub use selection::{SelectionManager, ViewState};
pub use store::LibraryStore;
pub use time::format_media_time;

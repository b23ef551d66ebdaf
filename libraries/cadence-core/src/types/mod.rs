mod artwork;
mod genre;
mod ids;
mod track;

pub use artwork::{Artwork, ArtworkSlot};
pub use genre::{Genre, GenreId};
pub use ids::{ArtistId, TrackId};
pub use track::Track;

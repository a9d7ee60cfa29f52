//! Remote music catalog: the data source behind every curation step.
//!
//! [`MusicCatalog`] abstracts the service; [`SpotifyWebCatalog`] talks to
//! the Spotify Web API with a caller-supplied access token.

pub mod error;
pub mod models;
pub mod spotify;
pub mod traits;

pub use error::CatalogError;
pub use models::{AlbumSummary, Cursor, Page, PlaylistSummary, TimeRange, Track};
pub use spotify::SpotifyWebCatalog;
pub use traits::{MusicCatalog, MAX_PLAYLIST_WRITE, MAX_TRACK_LOOKUP};

use super::error::CatalogError;
use super::models::{AlbumSummary, Cursor, Page, PlaylistSummary, TimeRange, Track};
use async_trait::async_trait;

/// Largest id batch accepted by [`MusicCatalog::tracks`].
pub const MAX_TRACK_LOOKUP: usize = 50;

/// Largest id batch accepted by [`MusicCatalog::add_playlist_items`].
pub const MAX_PLAYLIST_WRITE: usize = 100;

/// Remote music catalog the curation workflow reads from and writes to.
///
/// Every method is a single request. Callers never invoke these directly;
/// they go through [`crate::remote::RemoteCallExecutor`], which owns
/// timeouts and retries.
#[async_trait]
pub trait MusicCatalog: Send + Sync {
    /// Identifier of the authenticated user
    async fn current_user_id(&self) -> Result<String, CatalogError>;

    /// Playlists owned or followed by the user
    async fn user_playlists(
        &self,
        cursor: Option<Cursor>,
    ) -> Result<Page<PlaylistSummary>, CatalogError>;

    /// Track ids of a playlist. Local files and podcast episodes come back as `None`.
    async fn playlist_items(
        &self,
        playlist_id: &str,
        cursor: Option<Cursor>,
    ) -> Result<Page<Option<String>>, CatalogError>;

    /// Track ids from the user's liked collection
    async fn saved_tracks(&self, cursor: Option<Cursor>)
        -> Result<Page<Option<String>>, CatalogError>;

    async fn top_tracks(
        &self,
        offset: usize,
        limit: usize,
        time_range: TimeRange,
    ) -> Result<Vec<String>, CatalogError>;

    /// Resolve up to [`MAX_TRACK_LOOKUP`] ids. Unknown ids yield `None` in their slot.
    async fn tracks(&self, ids: &[String]) -> Result<Vec<Option<Track>>, CatalogError>;

    async fn artist_top_tracks(&self, artist_id: &str) -> Result<Vec<Track>, CatalogError>;
    async fn artist_albums(&self, artist_id: &str) -> Result<Vec<AlbumSummary>, CatalogError>;
    async fn album_tracks(&self, album_id: &str) -> Result<Vec<Track>, CatalogError>;

    /// Create a private playlist for `user_id`
    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<PlaylistSummary, CatalogError>;

    /// Replace the whole playlist contents. An empty slice clears it.
    async fn replace_playlist_items(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError>;

    /// Append up to [`MAX_PLAYLIST_WRITE`] tracks
    async fn add_playlist_items(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError>;
}

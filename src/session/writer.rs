//! Playlist creation and rewrites. Failures here propagate: a run that
//! cannot write its output has nothing left to do.

use super::CatalogSession;
use crate::catalog::MAX_PLAYLIST_WRITE;
use crate::remote::RemoteError;

impl CatalogSession {
    /// Id of the playlist named `name`, creating a private one if absent.
    pub async fn get_or_create_playlist(
        &self,
        name: &str,
        description: &str,
    ) -> Result<String, RemoteError> {
        if let Some(playlist_id) = self.playlist_id_by_name(name).await? {
            return Ok(playlist_id);
        }

        log::info!("Creating playlist '{}'", name);
        let user_id = self.user_id.clone();
        let created = self
            .call("create_playlist", |catalog| {
                let user_id = user_id.clone();
                let name = name.to_string();
                let description = description.to_string();
                async move {
                    catalog
                        .create_playlist(&user_id, &name, &description)
                        .await
                }
            })
            .await?;
        Ok(created.id)
    }

    pub async fn clear_playlist(&self, playlist_id: &str) -> Result<(), RemoteError> {
        self.call("clear_playlist", |catalog| {
            let playlist_id = playlist_id.to_string();
            async move { catalog.replace_playlist_items(&playlist_id, &[]).await }
        })
        .await
    }

    /// Append tracks in batches of [`MAX_PLAYLIST_WRITE`].
    pub async fn add_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), RemoteError> {
        let total_batches = track_ids.len().div_ceil(MAX_PLAYLIST_WRITE);
        log::info!("Adding {} tracks to playlist...", track_ids.len());

        for (idx, batch) in track_ids.chunks(MAX_PLAYLIST_WRITE).enumerate() {
            self.call("add_playlist_items", |catalog| {
                let playlist_id = playlist_id.to_string();
                let batch = batch.to_vec();
                async move { catalog.add_playlist_items(&playlist_id, &batch).await }
            })
            .await?;
            log::info!(
                "  ✓ Batch {}/{} - {} tracks added",
                idx + 1,
                total_batches,
                batch.len()
            );
        }

        log::info!("Completed - {} tracks added to playlist", track_ids.len());
        Ok(())
    }

    /// Clear, then add. Not a diff: the playlist ends up holding exactly `track_ids`.
    pub async fn replace_playlist(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), RemoteError> {
        self.clear_playlist(playlist_id).await?;
        if !track_ids.is_empty() {
            self.add_tracks(playlist_id, track_ids).await?;
        }
        Ok(())
    }
}

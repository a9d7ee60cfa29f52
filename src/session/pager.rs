//! Cursor-walking listings: playlists, liked tracks and top tracks.

use std::future::Future;
use std::sync::Arc;

use super::CatalogSession;
use crate::catalog::{CatalogError, Cursor, MusicCatalog, Page, TimeRange};
use crate::remote::RemoteError;

/// Playlist name that stands for the user's liked collection.
pub const LIKED_SONGS: &str = "Liked Songs";

const TOP_TRACKS_PAGE: usize = 50;

impl CatalogSession {
    /// Walk every page of a listing into one flat vector.
    ///
    /// Stops when a page has no continuation or comes back empty, so a
    /// malformed cursor cannot loop forever.
    pub(crate) async fn collect_pages<T, F, Fut>(
        &self,
        label: &str,
        mut fetch: F,
    ) -> Result<Vec<T>, RemoteError>
    where
        F: FnMut(Arc<dyn MusicCatalog>, Option<Cursor>) -> Fut,
        Fut: Future<Output = Result<Page<T>, CatalogError>> + Send + 'static,
        T: Send + 'static,
    {
        let mut items = Vec::new();
        let mut cursor: Option<Cursor> = None;
        let mut page_num = 0usize;

        loop {
            page_num += 1;
            let page = self
                .call(label, |catalog| fetch(catalog, cursor.clone()))
                .await?;

            let received = page.items.len();
            items.extend(page.items);
            log::debug!(
                "{}: page {} - {} items (total: {})",
                label,
                page_num,
                received,
                items.len()
            );

            match page.next {
                Some(next) if received > 0 => cursor = Some(next),
                _ => break,
            }
        }

        Ok(items)
    }

    /// Id of the first user playlist named exactly `name`.
    pub async fn playlist_id_by_name(&self, name: &str) -> Result<Option<String>, RemoteError> {
        let mut cursor: Option<Cursor> = None;

        loop {
            let page = self
                .call("user_playlists", |catalog| {
                    let cursor = cursor.clone();
                    async move { catalog.user_playlists(cursor).await }
                })
                .await?;

            if let Some(found) = page.items.iter().find(|p| p.name == name) {
                return Ok(Some(found.id.clone()));
            }

            match page.next {
                Some(next) if !page.items.is_empty() => cursor = Some(next),
                _ => return Ok(None),
            }
        }
    }

    /// Track ids of a playlist in playlist order, duplicates kept.
    pub async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<String>, RemoteError> {
        let slots = self
            .collect_pages("playlist_items", |catalog, cursor| {
                let playlist_id = playlist_id.to_string();
                async move { catalog.playlist_items(&playlist_id, cursor).await }
            })
            .await?;

        Ok(valid_ids(slots))
    }

    pub async fn liked_tracks(&self) -> Result<Vec<String>, RemoteError> {
        log::info!("Fetching liked tracks...");
        let slots = self
            .collect_pages("saved_tracks", |catalog, cursor| async move {
                catalog.saved_tracks(cursor).await
            })
            .await?;

        let ids = valid_ids(slots);
        log::info!("Completed - {} liked tracks fetched", ids.len());
        Ok(ids)
    }

    /// Up to `max_tracks` of the user's top tracks, best ranked first.
    pub async fn top_tracks(
        &self,
        max_tracks: usize,
        time_range: TimeRange,
    ) -> Result<Vec<String>, RemoteError> {
        let total_batches = max_tracks.div_ceil(TOP_TRACKS_PAGE);
        let mut ids = Vec::new();
        log::info!("Fetching top {} tracks ({})...", max_tracks, time_range);

        for (batch_idx, offset) in (0..max_tracks).step_by(TOP_TRACKS_PAGE).enumerate() {
            let limit = TOP_TRACKS_PAGE.min(max_tracks - offset);
            let page = self
                .call("top_tracks", move |catalog| async move {
                    catalog.top_tracks(offset, limit, time_range).await
                })
                .await?;

            if page.is_empty() {
                break;
            }
            let received = page.len();
            ids.extend(page);
            log::info!(
                "  ✓ Batch {}/{} - {} tracks (total: {})",
                batch_idx + 1,
                total_batches,
                received,
                ids.len()
            );
            if received < limit {
                break;
            }
        }

        log::info!("Completed - {} top tracks fetched", ids.len());
        Ok(ids)
    }

    /// Tracks of several playlists by name, in input order.
    ///
    /// [`LIKED_SONGS`] resolves to the liked collection; unknown names
    /// produce an empty list.
    pub async fn playlists_tracks(
        &self,
        names: &[String],
    ) -> Result<Vec<(String, Vec<String>)>, RemoteError> {
        let mut all = Vec::with_capacity(names.len());
        log::info!("Fetching tracks from {} playlists...", names.len());

        for (idx, name) in names.iter().enumerate() {
            log::info!("  Playlist {}/{}: {}", idx + 1, names.len(), name);
            let tracks = if name == LIKED_SONGS {
                self.liked_tracks().await?
            } else {
                match self.playlist_id_by_name(name).await? {
                    Some(playlist_id) => self.playlist_tracks(&playlist_id).await?,
                    None => {
                        log::warn!("    ✗ {} - Not found", name);
                        all.push((name.clone(), Vec::new()));
                        continue;
                    }
                }
            };
            log::info!("    ✓ {} - {} tracks", name, tracks.len());
            all.push((name.clone(), tracks));
        }

        Ok(all)
    }
}

fn valid_ids(slots: Vec<Option<String>>) -> Vec<String> {
    slots
        .into_iter()
        .flatten()
        .filter(|id| !id.trim().is_empty())
        .collect()
}

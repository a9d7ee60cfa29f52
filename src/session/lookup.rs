//! Bulk detail lookups and per-entity fan-outs.
//!
//! Failures here degrade instead of aborting: a failed detail batch is
//! skipped and a failed entity records an empty result.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use super::{CatalogSession, FAN_OUT_CHUNK};
use crate::catalog::{AlbumSummary, CatalogError, MusicCatalog, Track, MAX_TRACK_LOOKUP};

impl CatalogSession {
    /// Resolve track ids to metadata, [`MAX_TRACK_LOOKUP`] ids per request.
    ///
    /// Blank ids are dropped before batching. The result holds one entry
    /// per resolved id, in first-seen order.
    pub async fn tracks_info(&self, track_ids: &[String]) -> Vec<Track> {
        let valid: Vec<String> = track_ids
            .iter()
            .filter(|id| !id.trim().is_empty())
            .cloned()
            .collect();

        log::info!("Fetching track info for {} tracks...", valid.len());
        if valid.len() != track_ids.len() {
            log::info!(
                "Filtered out {} invalid track IDs",
                track_ids.len() - valid.len()
            );
        }
        if valid.is_empty() {
            log::info!("No valid track IDs to process");
            return Vec::new();
        }

        let total_batches = valid.len().div_ceil(MAX_TRACK_LOOKUP);
        let mut seen = HashSet::new();
        let mut info = Vec::new();

        for (idx, batch) in valid.chunks(MAX_TRACK_LOOKUP).enumerate() {
            let batch_num = idx + 1;
            let result = self
                .call("tracks", |catalog| {
                    let batch = batch.to_vec();
                    async move { catalog.tracks(&batch).await }
                })
                .await;

            match result {
                Ok(slots) => {
                    let mut processed = 0;
                    for track in slots.into_iter().flatten() {
                        processed += 1;
                        if seen.insert(track.id.clone()) {
                            info.push(track);
                        }
                    }
                    log::info!(
                        "  ✓ Batch {}/{} - {} tracks",
                        batch_num,
                        total_batches,
                        processed
                    );
                }
                Err(e) => {
                    log::warn!(
                        "  ✗ Batch {}/{} - Error getting track info: {}",
                        batch_num,
                        total_batches,
                        e
                    );
                }
            }
        }

        log::info!("Completed - {} tracks processed", info.len());
        info
    }

    /// Top tracks per artist, one request per artist.
    pub async fn artists_top_tracks(&self, artist_ids: &[String]) -> HashMap<String, Vec<Track>> {
        log::info!("Fetching top tracks for {} artists...", artist_ids.len());
        self.fan_out("artist_top_tracks", "artist", artist_ids, |catalog, id| async move {
            catalog.artist_top_tracks(&id).await
        })
        .await
    }

    /// Albums and singles per artist.
    pub async fn artists_albums(
        &self,
        artist_ids: &[String],
    ) -> HashMap<String, Vec<AlbumSummary>> {
        log::info!("Fetching albums for {} artists...", artist_ids.len());
        self.fan_out("artist_albums", "artist", artist_ids, |catalog, id| async move {
            catalog.artist_albums(&id).await
        })
        .await
    }

    pub async fn albums_tracks(&self, album_ids: &[String]) -> HashMap<String, Vec<Track>> {
        log::info!("Fetching tracks for {} albums...", album_ids.len());
        self.fan_out("album_tracks", "album", album_ids, |catalog, id| async move {
            catalog.album_tracks(&id).await
        })
        .await
    }

    async fn fan_out<T, F, Fut>(
        &self,
        label: &str,
        entity: &str,
        ids: &[String],
        mut fetch: F,
    ) -> HashMap<String, Vec<T>>
    where
        F: FnMut(Arc<dyn MusicCatalog>, String) -> Fut,
        Fut: Future<Output = Result<Vec<T>, CatalogError>> + Send + 'static,
        T: Send + 'static,
    {
        let total_chunks = ids.len().div_ceil(FAN_OUT_CHUNK);
        let mut results = HashMap::with_capacity(ids.len());
        let mut errors = 0usize;

        for (chunk_idx, chunk) in ids.chunks(FAN_OUT_CHUNK).enumerate() {
            for id in chunk {
                let outcome = self
                    .call(label, |catalog| fetch(catalog, id.clone()))
                    .await;
                match outcome {
                    Ok(items) => {
                        results.insert(id.clone(), items);
                    }
                    Err(e) => {
                        log::warn!("Error in {} for {} {}: {}", label, entity, id, e);
                        results.insert(id.clone(), Vec::new());
                        errors += 1;
                    }
                }
            }
            log::info!(
                "  ✓ Batch {}/{} completed ({} {}s)",
                chunk_idx + 1,
                total_chunks,
                chunk.len(),
                entity
            );
        }

        log::info!(
            "Completed - {} {}s processed, {} errors",
            ids.len() - errors,
            entity,
            errors
        );
        results
    }
}

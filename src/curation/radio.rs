//! Radio: top tracks from artists sampled out of the master playlist.

use chrono::Local;

use super::engine::WeightedCurationEngine;
use super::random::RandomSource;
use super::signals::ArtistAggregate;
use crate::catalog::Track;
use crate::remote::RemoteError;
use crate::session::CatalogSession;

/// Top tracks considered per sampled artist.
pub const RADIO_TOP_TRACKS: usize = 10;

#[derive(Debug, Clone)]
pub struct RadioSettings {
    pub artist_count: usize,
    pub songs_per_artist: usize,
    pub remove_by_weight: bool,
    pub include_discover: bool,
    pub discover_playlist_name: String,
    pub radio_playlist_name: String,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            artist_count: 5,
            songs_per_artist: 10,
            remove_by_weight: false,
            include_discover: false,
            discover_playlist_name: "Discover Weekly".to_string(),
            radio_playlist_name: "[RX] Radio".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RadioOutcome {
    pub playlist_id: String,
    /// Final playlist contents, in written order.
    pub tracks: Vec<String>,
    pub chosen_artists: Vec<String>,
    /// Candidates that lost the weighted draw.
    pub filtered_by_weight: usize,
}

/// Eligible picks for one artist.
#[derive(Debug, Default, PartialEq)]
struct ArtistPicks {
    selected: Vec<String>,
    eligible: usize,
    filtered_by_weight: usize,
}

pub struct RadioGenerator<'a> {
    session: &'a CatalogSession,
    engine: &'a WeightedCurationEngine,
    settings: RadioSettings,
}

impl<'a> RadioGenerator<'a> {
    pub fn new(
        session: &'a CatalogSession,
        engine: &'a WeightedCurationEngine,
        settings: RadioSettings,
    ) -> Self {
        Self {
            session,
            engine,
            settings,
        }
    }

    /// Rebuild the radio playlist from the artists of `master_playlist_id`.
    pub async fn generate<R: RandomSource>(
        &self,
        master_playlist_id: &str,
        rng: &mut R,
    ) -> Result<RadioOutcome, RemoteError> {
        log::info!("Generating radio...");
        let mut radio_tracks = Vec::new();

        if self.settings.include_discover {
            radio_tracks.extend(self.discover_tracks().await?);
        }

        let master_ids = self.session.playlist_tracks(master_playlist_id).await?;
        let master_info = self.session.tracks_info(&master_ids).await;
        let artists = ArtistAggregate::from_tracks(&master_info);

        let chosen = self.choose_artists(&artists, rng);
        let chosen_names: Vec<String> = chosen
            .iter()
            .filter_map(|id| artists.name(id).map(str::to_string))
            .collect();
        log::info!("Chosen artists for radio: {:?}", chosen_names);

        let eligible: Vec<String> = chosen
            .iter()
            .filter(|id| {
                let name = artists.name(id).unwrap_or_default();
                if self.engine.is_blacklisted(name) {
                    log::info!("  Skipping blacklisted artist: {}", name);
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect();

        let mut top_tracks = self.session.artists_top_tracks(&eligible).await;
        let mut filtered_by_weight = 0;

        for (idx, artist_id) in eligible.iter().enumerate() {
            let name = artists.name(artist_id).unwrap_or_default();
            let mut candidates = top_tracks.remove(artist_id).unwrap_or_default();
            candidates.truncate(RADIO_TOP_TRACKS);
            log::info!(
                "Processing artist {}/{}: {} ({} top tracks available)",
                idx + 1,
                eligible.len(),
                name,
                candidates.len()
            );

            let picks = self.pick_for_artist(&candidates, rng);
            filtered_by_weight += picks.filtered_by_weight;
            if picks.selected.is_empty() {
                log::info!("  No eligible tracks found for {}", name);
            } else {
                log::info!(
                    "  Selected {} tracks from {} eligible tracks for {}",
                    picks.selected.len(),
                    picks.eligible,
                    name
                );
            }
            radio_tracks.extend(picks.selected);
        }

        if self.settings.remove_by_weight {
            log::info!("Filtered out {} songs based on weight", filtered_by_weight);
        }

        rng.shuffle(&mut radio_tracks);

        let description = format!(
            "{} generated by script - {}",
            self.settings.radio_playlist_name,
            Local::now().format("%Y-%m-%d")
        );
        let playlist_id = self
            .session
            .get_or_create_playlist(&self.settings.radio_playlist_name, &description)
            .await?;
        self.session
            .replace_playlist(&playlist_id, &radio_tracks)
            .await?;
        log::info!(
            "Updated '{}' with {} tracks",
            self.settings.radio_playlist_name,
            radio_tracks.len()
        );

        Ok(RadioOutcome {
            playlist_id,
            tracks: radio_tracks,
            chosen_artists: chosen_names,
            filtered_by_weight,
        })
    }

    async fn discover_tracks(&self) -> Result<Vec<String>, RemoteError> {
        let name = &self.settings.discover_playlist_name;
        match self.session.playlist_id_by_name(name).await? {
            Some(playlist_id) => {
                let tracks = self.session.playlist_tracks(&playlist_id).await?;
                log::info!("Including {} tracks from {}", tracks.len(), name);
                Ok(tracks)
            }
            None => {
                log::warn!("Playlist '{}' not found, radio goes without it", name);
                Ok(Vec::new())
            }
        }
    }

    /// Distinct artists sampled uniformly, capped at what is available.
    fn choose_artists<R: RandomSource>(&self, artists: &ArtistAggregate, rng: &mut R) -> Vec<String> {
        let count = self.settings.artist_count.min(artists.len());
        rng.choose_many(artists.artist_ids(), count)
    }

    fn pick_for_artist<R: RandomSource>(&self, candidates: &[Track], rng: &mut R) -> ArtistPicks {
        let mut picks = ArtistPicks::default();
        let mut pool = Vec::with_capacity(candidates.len());

        for track in candidates {
            if self.engine.is_title_excluded(&track.title) {
                log::info!("    Skipping '{}' - contains excluded word", track.title);
                continue;
            }
            if self.settings.remove_by_weight {
                let weight = self.engine.weight(&track.id);
                if !WeightedCurationEngine::draw(weight, rng) {
                    log::debug!("    Dropped '{}' at weight {}", track.title, weight);
                    picks.filtered_by_weight += 1;
                    continue;
                }
            }
            pool.push(track.id.clone());
        }

        picks.eligible = pool.len();
        picks.selected = if pool.len() <= self.settings.songs_per_artist {
            pool
        } else {
            rng.choose_many(&pool, self.settings.songs_per_artist)
        };
        picks
    }
}

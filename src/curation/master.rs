//! Master playlist curation over every configured source playlist.

use std::collections::HashSet;

use super::engine::{Decision, WeightedCurationEngine};
use super::random::RandomSource;
use super::signals::ArtistOverplay;
use crate::catalog::Track;
use crate::remote::RemoteError;
use crate::session::{CatalogSession, LIKED_SONGS};

#[derive(Debug, Clone)]
pub struct MasterSettings {
    pub source_playlists: Vec<String>,
    pub include_liked: bool,
    pub max_songs: usize,
    pub include_radio: bool,
    pub artist_overplay: bool,
    pub master_playlist_name: String,
    pub radio_playlist_name: String,
}

impl Default for MasterSettings {
    fn default() -> Self {
        Self {
            source_playlists: Vec::new(),
            include_liked: false,
            max_songs: 1000,
            include_radio: false,
            artist_overplay: false,
            master_playlist_name: "[RX] Master".to_string(),
            radio_playlist_name: "[RX] Radio".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MasterOutcome {
    /// Distinct candidates after de-duplication.
    pub candidates: usize,
    /// Curated tracks kept after truncation.
    pub selected: usize,
    pub radio_added: usize,
    pub tracks: Vec<String>,
    /// False when nothing was selected and the playlist was left alone.
    pub written: bool,
}

/// Tallies of the per-track decisions, for the run log.
#[derive(Debug, Default, PartialEq)]
struct DecisionTally {
    included: usize,
    dropped: usize,
    blacklisted: usize,
    title_excluded: usize,
}

pub struct MasterCurator<'a> {
    session: &'a CatalogSession,
    engine: &'a WeightedCurationEngine,
    settings: MasterSettings,
}

impl<'a> MasterCurator<'a> {
    pub fn new(
        session: &'a CatalogSession,
        engine: &'a WeightedCurationEngine,
        settings: MasterSettings,
    ) -> Self {
        Self {
            session,
            engine,
            settings,
        }
    }

    pub async fn curate<R: RandomSource>(
        &self,
        master_playlist_id: &str,
        rng: &mut R,
    ) -> Result<MasterOutcome, RemoteError> {
        let candidates = self.candidate_tracks().await?;
        log::info!("{} distinct candidate tracks", candidates.len());

        let artist_overplay = self
            .settings
            .artist_overplay
            .then(|| self.engine.signals().artist_overplay(&candidates));

        let mut selected = self.select(&candidates, artist_overplay.as_ref(), rng);
        if selected.is_empty() {
            log::warn!(
                "No tracks selected, leaving '{}' untouched",
                self.settings.master_playlist_name
            );
            return Ok(MasterOutcome {
                candidates: candidates.len(),
                ..MasterOutcome::default()
            });
        }

        rng.shuffle(&mut selected);
        if selected.len() > self.settings.max_songs {
            log::info!(
                "Selected tracks exceed the {} song limit, truncating",
                self.settings.max_songs
            );
            selected.truncate(self.settings.max_songs);
        }
        let selected_count = selected.len();

        let mut radio_added = 0;
        if self.settings.include_radio {
            let radio = self.radio_tracks().await?;
            radio_added = radio.len();
            if radio_added > 0 {
                selected.extend(radio);
                rng.shuffle(&mut selected);
                log::info!(
                    "Final '{}' contains {} master + {} radio = {} tracks total",
                    self.settings.master_playlist_name,
                    selected_count,
                    radio_added,
                    selected.len()
                );
            }
        }

        self.session
            .replace_playlist(master_playlist_id, &selected)
            .await?;
        log::info!(
            "Updated '{}' with {} tracks",
            self.settings.master_playlist_name,
            selected.len()
        );

        Ok(MasterOutcome {
            candidates: candidates.len(),
            selected: selected_count,
            radio_added,
            tracks: selected,
            written: true,
        })
    }

    /// Union of all sources, resolved and collapsed by id, then by
    /// `title - artist` (first occurrence wins).
    async fn candidate_tracks(&self) -> Result<Vec<Track>, RemoteError> {
        let mut raw_ids: Vec<String> = self
            .session
            .playlists_tracks(&self.settings.source_playlists)
            .await?
            .into_iter()
            .flat_map(|(_, ids)| ids)
            .collect();

        let liked_listed = self
            .settings
            .source_playlists
            .iter()
            .any(|name| name == LIKED_SONGS);
        if self.settings.include_liked && !liked_listed {
            raw_ids.extend(self.session.liked_tracks().await?);
        }

        let mut seen = HashSet::new();
        raw_ids.retain(|id| seen.insert(id.clone()));

        let info = self.session.tracks_info(&raw_ids).await;
        let mut keys = HashSet::new();
        Ok(info
            .into_iter()
            .filter(|track| keys.insert(track.display_key()))
            .collect())
    }

    fn select<R: RandomSource>(
        &self,
        tracks: &[Track],
        artist_overplay: Option<&ArtistOverplay>,
        rng: &mut R,
    ) -> Vec<String> {
        let mut tally = DecisionTally::default();
        let mut selected = Vec::new();

        for track in tracks {
            match self.engine.decide(track, artist_overplay, rng) {
                Decision::Included { .. } => {
                    tally.included += 1;
                    selected.push(track.id.clone());
                }
                Decision::Dropped { weight } => {
                    tally.dropped += 1;
                    log::debug!("{} by {}: weight={}, excluded", track.title, track.artist_name, weight);
                }
                Decision::Blacklisted => {
                    tally.blacklisted += 1;
                    log::debug!("{} by {}: blacklisted", track.title, track.artist_name);
                }
                Decision::TitleExcluded => tally.title_excluded += 1,
            }
        }

        log::info!(
            "Master decisions: {} included, {} dropped by weight, {} blacklisted, {} excluded by title",
            tally.included,
            tally.dropped,
            tally.blacklisted,
            tally.title_excluded
        );
        selected
    }

    async fn radio_tracks(&self) -> Result<Vec<String>, RemoteError> {
        let name = &self.settings.radio_playlist_name;
        match self.session.playlist_id_by_name(name).await? {
            Some(playlist_id) => self.session.playlist_tracks(&playlist_id).await,
            None => {
                log::warn!("Radio playlist '{}' not found", name);
                Ok(Vec::new())
            }
        }
    }
}

//! Run configuration: a camelCase JSON document plus command-line overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::TimeRange;
use crate::cli::Args;
use crate::curation::{MasterSettings, RadioSettings, SignalOptions};
use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurationConfig {
    pub number_of_radio_artists: usize,
    pub radio_artist_songs: usize,
    pub weight_modifier: f64,
    pub remove_radio_songs_by_weight: bool,
    pub include_discover_weekly_in_radio: bool,
    pub include_radio_in_master: bool,
    pub artist_i_hear_too_much: bool,
    pub artist_blacklist: bool,
    pub playlists_to_include: Vec<String>,
    pub excluded_words: Vec<String>,
    pub master_songs: usize,
    pub include_liked_songs: bool,
    pub top_tracks_limit: usize,
    pub top_tracks_time_range: TimeRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub master_playlist_name: String,
    pub radio_playlist_name: String,
    pub overplayed_playlist_name: String,
    pub discover_playlist_name: String,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            number_of_radio_artists: 5,
            radio_artist_songs: 10,
            weight_modifier: 1.0,
            remove_radio_songs_by_weight: false,
            include_discover_weekly_in_radio: false,
            include_radio_in_master: false,
            artist_i_hear_too_much: false,
            artist_blacklist: false,
            playlists_to_include: Vec::new(),
            excluded_words: Vec::new(),
            master_songs: 1000,
            include_liked_songs: false,
            top_tracks_limit: 200,
            top_tracks_time_range: TimeRange::MediumTerm,
            access_token: None,
            master_playlist_name: "[RX] Master".to_string(),
            radio_playlist_name: "[RX] Radio".to_string(),
            overplayed_playlist_name: "[RX] Songs I Hear Too Much".to_string(),
            discover_playlist_name: "Discover Weekly".to_string(),
        }
    }
}

impl CurationConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if !self.weight_modifier.is_finite() {
            return Err(AppError::Config(format!(
                "weightModifier must be a finite number, got {}",
                self.weight_modifier
            )));
        }
        Ok(())
    }

    /// Merge command-line values over the file values.
    pub fn apply_overrides(&mut self, args: &Args) -> Result<(), AppError> {
        if let Some(n) = args.number_of_radio_artists {
            self.number_of_radio_artists = n;
        }
        if let Some(n) = args.radio_artist_songs {
            self.radio_artist_songs = n;
        }
        if let Some(m) = args.weight_modifier {
            self.weight_modifier = m;
        }
        if let Some(n) = args.master_songs {
            self.master_songs = n;
        }
        if let Some(n) = args.top_tracks_limit {
            self.top_tracks_limit = n;
        }
        if let Some(range) = args.top_tracks_time_range {
            self.top_tracks_time_range = range;
        }
        if let Some(token) = &args.access_token {
            self.access_token = Some(token.clone());
        }

        self.remove_radio_songs_by_weight |= args.remove_radio_songs_by_weight;
        self.include_radio_in_master |= args.include_radio_in_master;
        self.include_discover_weekly_in_radio |= args.include_discover_weekly_in_radio;
        self.artist_i_hear_too_much |= args.artist_i_hear_too_much;
        self.artist_blacklist |= args.artist_blacklist;
        self.include_liked_songs |= args.include_liked_songs;

        if !args.playlists_to_include.is_empty() {
            self.playlists_to_include = args.playlists_to_include.clone();
        }
        if !args.excluded_words.is_empty() {
            self.excluded_words = args.excluded_words.clone();
        }

        self.validate()
    }

    pub fn signal_options(&self) -> SignalOptions {
        SignalOptions {
            top_tracks_limit: self.top_tracks_limit,
            time_range: self.top_tracks_time_range,
            artist_overplay: self.artist_i_hear_too_much,
            artist_blacklist: self.artist_blacklist,
        }
    }

    pub fn radio_settings(&self) -> RadioSettings {
        RadioSettings {
            artist_count: self.number_of_radio_artists,
            songs_per_artist: self.radio_artist_songs,
            remove_by_weight: self.remove_radio_songs_by_weight,
            include_discover: self.include_discover_weekly_in_radio,
            discover_playlist_name: self.discover_playlist_name.clone(),
            radio_playlist_name: self.radio_playlist_name.clone(),
        }
    }

    pub fn master_settings(&self) -> MasterSettings {
        MasterSettings {
            source_playlists: self.playlists_to_include.clone(),
            include_liked: self.include_liked_songs,
            max_songs: self.master_songs,
            include_radio: self.include_radio_in_master,
            artist_overplay: self.artist_i_hear_too_much,
            master_playlist_name: self.master_playlist_name.clone(),
            radio_playlist_name: self.radio_playlist_name.clone(),
        }
    }
}

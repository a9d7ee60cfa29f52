use clap::Parser;
use std::path::PathBuf;

use crate::catalog::TimeRange;

/// Command-line overrides for a curation run.
///
/// Values given here win over the config file. Feature flags can only
/// switch a feature on.
#[derive(Parser, Debug, Default)]
#[command(name = "playlistrx")]
#[command(about = "Rebuild the [RX] master and radio playlists from your listening history")]
pub struct Args {
    /// Config file (JSON); a missing file means defaults
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Spotify Web API bearer token
    #[arg(long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Number of artists sampled for the radio playlist
    #[arg(long)]
    pub number_of_radio_artists: Option<usize>,

    /// Top songs taken per radio artist
    #[arg(long)]
    pub radio_artist_songs: Option<usize>,

    /// Scales every weight deduction
    #[arg(long)]
    pub weight_modifier: Option<f64>,

    /// Drop radio songs through the weighted draw
    #[arg(long)]
    pub remove_radio_songs_by_weight: bool,

    /// Fold the radio playlist into the master playlist
    #[arg(long)]
    pub include_radio_in_master: bool,

    /// Seed the radio with the Discover Weekly playlist
    #[arg(long)]
    pub include_discover_weekly_in_radio: bool,

    /// Penalise artists that crowd the overplayed playlist
    #[arg(long)]
    pub artist_i_hear_too_much: bool,

    /// Exclude artists with 10+ overplayed songs entirely
    #[arg(long)]
    pub artist_blacklist: bool,

    /// Add the liked collection to the master sources
    #[arg(long)]
    pub include_liked_songs: bool,

    /// Source playlists for the master playlist (replaces the configured list)
    #[arg(long, num_args = 1..)]
    pub playlists_to_include: Vec<String>,

    /// Title words that exclude a track (replaces the configured list)
    #[arg(long, num_args = 1..)]
    pub excluded_words: Vec<String>,

    /// Maximum master songs before radio tracks are added
    #[arg(long)]
    pub master_songs: Option<usize>,

    /// How many top tracks feed the rank deduction
    #[arg(long)]
    pub top_tracks_limit: Option<usize>,

    /// Listening window for top tracks (short_term, medium_term, long_term)
    #[arg(long)]
    pub top_tracks_time_range: Option<TimeRange>,

    /// Fix the random source for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,
}

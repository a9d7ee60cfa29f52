//! Listening signals gathered once per run and read-only afterwards.

use std::collections::{HashMap, HashSet};

use crate::catalog::{TimeRange, Track};
use crate::remote::RemoteError;
use crate::session::CatalogSession;

/// Overplayed occurrences from which an artist counts as "frequent".
pub const FREQUENT_ARTIST_THRESHOLD: u32 = 3;
/// Overplayed occurrences from which an artist is blacklisted.
pub const BLACKLIST_THRESHOLD: u32 = 10;

/// Occurrences of each track id in the overplayed playlist.
#[derive(Debug, Clone, Default)]
pub struct OverplayCounter(HashMap<String, u32>);

impl OverplayCounter {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts = HashMap::new();
        for id in ids {
            *counts.entry(id.into()).or_insert(0) += 1;
        }
        Self(counts)
    }

    pub fn count(&self, track_id: &str) -> u32 {
        self.0.get(track_id).copied().unwrap_or(0)
    }

    /// Distinct track ids with at least one occurrence.
    pub fn track_ids(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 0-based position of each track in the user's top tracks.
#[derive(Debug, Clone, Default)]
pub struct TopTrackRank(HashMap<String, usize>);

impl TopTrackRank {
    /// Ranks follow iteration order; a repeated id keeps its best rank.
    pub fn from_ranked<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ranks = HashMap::new();
        for (rank, id) in ids.into_iter().enumerate() {
            ranks.entry(id.into()).or_insert(rank);
        }
        Self(ranks)
    }

    pub fn rank(&self, track_id: &str) -> Option<usize> {
        self.0.get(track_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Artist display names matched by case-insensitive substring.
#[derive(Debug, Clone, Default)]
pub struct BlacklistSet {
    names: Vec<String>,
}

impl BlacklistSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = names
            .into_iter()
            .map(|n| n.as_ref().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        names.sort();
        names.dedup();
        Self { names }
    }

    /// True when any blacklisted name occurs inside `artist_name`.
    pub fn matches(&self, artist_name: &str) -> bool {
        if self.names.is_empty() {
            return false;
        }
        let artist = artist_name.to_lowercase();
        self.names.iter().any(|name| artist.contains(name.as_str()))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ArtistEntry {
    pub name: String,
    pub track_ids: Vec<String>,
}

/// Tracks grouped by artist id, in first-seen artist order.
///
/// Tracks without an artist id are left out. The display name is the one
/// carried by the artist's first track.
#[derive(Debug, Clone, Default)]
pub struct ArtistAggregate {
    order: Vec<String>,
    artists: HashMap<String, ArtistEntry>,
}

impl ArtistAggregate {
    pub fn from_tracks<'a>(tracks: impl IntoIterator<Item = &'a Track>) -> Self {
        let mut aggregate = Self::default();
        for track in tracks {
            let Some(artist_id) = track.artist_id.as_deref() else {
                continue;
            };
            let entry = aggregate
                .artists
                .entry(artist_id.to_string())
                .or_insert_with(|| {
                    aggregate.order.push(artist_id.to_string());
                    ArtistEntry {
                        name: track.artist_name.clone(),
                        track_ids: Vec::new(),
                    }
                });
            entry.track_ids.push(track.id.clone());
        }
        aggregate
    }

    pub fn artist_ids(&self) -> &[String] {
        &self.order
    }

    pub fn get(&self, artist_id: &str) -> Option<&ArtistEntry> {
        self.artists.get(artist_id)
    }

    pub fn name(&self, artist_id: &str) -> Option<&str> {
        self.artists.get(artist_id).map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Overplayed occurrences per artist id over a set of resolved tracks.
#[derive(Debug, Clone, Default)]
pub struct ArtistOverplay(HashMap<String, u32>);

impl ArtistOverplay {
    pub fn occurrences(&self, artist_id: &str) -> u32 {
        self.0.get(artist_id).copied().unwrap_or(0)
    }
}

/// Everything the weight function and the exclusion rules read.
#[derive(Debug, Clone, Default)]
pub struct ListeningSignals {
    pub top_ranks: TopTrackRank,
    pub overplay: OverplayCounter,
    /// Artist ids eligible for the artist-overplay deduction.
    pub frequent_artists: HashSet<String>,
    pub blacklist: BlacklistSet,
}

/// Which artist-level signals to derive from the overplayed playlist.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalOptions {
    pub top_tracks_limit: usize,
    pub time_range: TimeRange,
    pub artist_overplay: bool,
    pub artist_blacklist: bool,
}

impl ListeningSignals {
    /// Fetch top tracks and the overplayed playlist, then derive artist
    /// counts from the overplayed tracks' metadata.
    pub async fn gather(
        session: &CatalogSession,
        overplayed_playlist_id: &str,
        options: SignalOptions,
    ) -> Result<Self, RemoteError> {
        let top = session
            .top_tracks(options.top_tracks_limit, options.time_range)
            .await?;
        let overplayed = session.playlist_tracks(overplayed_playlist_id).await?;
        log::info!(
            "Overplayed playlist holds {} entries ({} top tracks ranked)",
            overplayed.len(),
            top.len()
        );

        let top_ranks = TopTrackRank::from_ranked(top);
        let overplay = OverplayCounter::from_ids(overplayed);

        let mut signals = Self {
            top_ranks,
            overplay,
            ..Self::default()
        };
        if !(options.artist_overplay || options.artist_blacklist) || signals.overplay.is_empty() {
            return Ok(signals);
        }

        let info = session.tracks_info(&signals.overplay.track_ids()).await;
        let counts = signals.artist_name_counts(&info);

        if options.artist_overplay {
            signals.frequent_artists = frequent_artist_ids(&info, &counts);
            log::info!(
                "{} artists appear at least {} times in overplayed tracks",
                signals.frequent_artists.len(),
                FREQUENT_ARTIST_THRESHOLD
            );
        }
        if options.artist_blacklist {
            signals.blacklist = BlacklistSet::new(
                counts
                    .iter()
                    .filter(|(_, count)| **count >= BLACKLIST_THRESHOLD)
                    .map(|(name, _)| name),
            );
            log::info!("Blacklisted artists: {:?}", signals.blacklist.names());
        }
        Ok(signals)
    }

    /// Occurrences per artist display name, weighted by how often each
    /// track repeats in the overplayed playlist.
    pub fn artist_name_counts(&self, overplayed_info: &[Track]) -> HashMap<String, u32> {
        let mut counts = HashMap::new();
        for track in overplayed_info {
            *counts.entry(track.artist_name.clone()).or_insert(0) += self.overplay.count(&track.id);
        }
        counts
    }

    /// Per-artist overplay over `tracks`, for the frequent artists only.
    ///
    /// Computed once per curation pass instead of rescanning the track set
    /// for every weight.
    pub fn artist_overplay(&self, tracks: &[Track]) -> ArtistOverplay {
        let mut occurrences = HashMap::new();
        for track in tracks {
            let Some(artist_id) = track.artist_id.as_deref() else {
                continue;
            };
            if !self.frequent_artists.contains(artist_id) {
                continue;
            }
            let count = self.overplay.count(&track.id);
            if count > 0 {
                *occurrences.entry(artist_id.to_string()).or_insert(0) += count;
            }
        }
        ArtistOverplay(occurrences)
    }
}

fn frequent_artist_ids(info: &[Track], name_counts: &HashMap<String, u32>) -> HashSet<String> {
    info.iter()
        .filter(|t| name_counts.get(&t.artist_name).copied().unwrap_or(0) >= FREQUENT_ARTIST_THRESHOLD)
        .filter_map(|t| t.artist_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RetryPolicy;
    use crate::testing::FakeCatalog;
    use std::sync::Arc;

    fn track(id: &str, artist: &str, artist_id: &str) -> Track {
        Track::new(id, format!("Song {}", id), artist, Some(artist_id.to_string()))
    }

    #[test]
    fn test_overplay_counts_duplicates() {
        let counter = OverplayCounter::from_ids(["a", "b", "a", "a"]);
        assert_eq!(counter.count("a"), 3);
        assert_eq!(counter.count("b"), 1);
        assert_eq!(counter.count("z"), 0);
        assert_eq!(counter.len(), 2);
    }

    #[test]
    fn test_top_rank_keeps_first_position() {
        let ranks = TopTrackRank::from_ranked(["x", "y", "x"]);
        assert_eq!(ranks.rank("x"), Some(0));
        assert_eq!(ranks.rank("y"), Some(1));
        assert_eq!(ranks.rank("z"), None);
    }

    #[test]
    fn test_blacklist_substring_case_insensitive() {
        let blacklist = BlacklistSet::new(["Drake"]);
        assert!(blacklist.matches("drake"));
        assert!(blacklist.matches("DRAKE & Future"));
        assert!(!blacklist.matches("Drak"));
        assert!(!BlacklistSet::default().matches("Drake"));
    }

    #[test]
    fn test_aggregate_groups_by_artist() {
        let mut orphan = track("t4", "Nobody", "x");
        orphan.artist_id = None;
        let tracks = vec![
            track("t1", "One", "a1"),
            track("t2", "Two", "a2"),
            track("t3", "One (alias)", "a1"),
            orphan,
        ];

        let aggregate = ArtistAggregate::from_tracks(&tracks);

        assert_eq!(aggregate.artist_ids(), ["a1", "a2"]);
        assert_eq!(aggregate.name("a1"), Some("One"));
        assert_eq!(aggregate.get("a1").unwrap().track_ids, vec!["t1", "t3"]);
    }

    #[test]
    fn test_artist_overplay_only_for_frequent_artists() {
        let signals = ListeningSignals {
            overplay: OverplayCounter::from_ids(["t1", "t1", "t2", "t3"]),
            frequent_artists: HashSet::from(["a1".to_string()]),
            ..ListeningSignals::default()
        };
        let tracks = vec![
            track("t1", "One", "a1"),
            track("t2", "One", "a1"),
            track("t3", "Two", "a2"),
        ];

        let overplay = signals.artist_overplay(&tracks);

        assert_eq!(overplay.occurrences("a1"), 3);
        assert_eq!(overplay.occurrences("a2"), 0);
    }

    #[tokio::test]
    async fn test_gather_derives_blacklist_and_frequent_artists() {
        let mut overplayed: Vec<String> = vec!["h1".to_string(); 6];
        overplayed.extend(vec!["h2".to_string(); 4]);
        overplayed.extend(vec!["m1".to_string(); 3]);
        overplayed.push("s1".to_string());

        let catalog = Arc::new(
            FakeCatalog::new()
                .with_playlist("over", "[RX] Songs I Hear Too Much", &overplayed)
                .with_top(&["h1".to_string(), "s1".to_string()])
                .with_tracks([
                    track("h1", "Heavy", "ah"),
                    track("h2", "Heavy", "ah"),
                    track("m1", "Medium", "am"),
                    track("s1", "Single", "as"),
                ]),
        );
        let session = CatalogSession::connect(catalog.clone(), RetryPolicy::default())
            .await
            .unwrap();

        let options = SignalOptions {
            top_tracks_limit: 50,
            artist_overplay: true,
            artist_blacklist: true,
            ..SignalOptions::default()
        };
        let signals = ListeningSignals::gather(&session, "over", options).await.unwrap();

        assert_eq!(signals.top_ranks.rank("s1"), Some(1));
        assert_eq!(signals.overplay.count("h1"), 6);
        assert!(signals.blacklist.matches("heavy"));
        assert!(!signals.blacklist.matches("Medium"));
        assert!(signals.frequent_artists.contains("ah"));
        assert!(signals.frequent_artists.contains("am"));
        assert!(!signals.frequent_artists.contains("as"));
    }

    #[tokio::test]
    async fn test_gather_skips_metadata_when_features_off() {
        let catalog = Arc::new(
            FakeCatalog::new().with_playlist("over", "Over", &vec!["h1".to_string(); 12]),
        );
        let session = CatalogSession::connect(catalog.clone(), RetryPolicy::default())
            .await
            .unwrap();

        let signals = ListeningSignals::gather(&session, "over", SignalOptions::default())
            .await
            .unwrap();

        assert_eq!(signals.overplay.count("h1"), 12);
        assert!(signals.blacklist.is_empty());
        assert_eq!(catalog.requests("tracks"), 0);
    }
}

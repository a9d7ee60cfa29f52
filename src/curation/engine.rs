//! Per-track weights and probabilistic inclusion.

use super::random::RandomSource;
use super::signals::{ArtistOverplay, ListeningSignals};
use crate::catalog::Track;

pub const MAX_WEIGHT: f64 = 10.0;

/// Deduction units for a track's overplay count.
pub fn overplay_penalty(count: u32) -> f64 {
    match count {
        0 => 0.0,
        1 => 5.0,
        2 => 7.0,
        _ => 9.0,
    }
}

/// Deduction units for a top-tracks position; unranked tracks lose nothing.
pub fn rank_penalty(rank: Option<usize>) -> f64 {
    match rank {
        Some(r) if r < 50 => 5.0,
        Some(r) if r < 100 => 4.0,
        Some(r) if r < 200 => 3.0,
        _ => 0.0,
    }
}

/// Deduction units for an artist's aggregate overplay.
pub fn artist_penalty(occurrences: u32) -> f64 {
    match occurrences {
        n if n >= 6 => 3.0,
        n if n >= 3 => 2.0,
        _ => 0.0,
    }
}

/// Outcome of running one track through the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Included { weight: f64 },
    /// Lost the random draw.
    Dropped { weight: f64 },
    Blacklisted,
    TitleExcluded,
}

impl Decision {
    pub fn is_included(&self) -> bool {
        matches!(self, Decision::Included { .. })
    }
}

pub struct WeightedCurationEngine {
    signals: ListeningSignals,
    modifier: f64,
    excluded_words: Vec<String>,
}

impl WeightedCurationEngine {
    pub fn new(signals: ListeningSignals, modifier: f64, excluded_words: &[String]) -> Self {
        Self {
            signals,
            modifier,
            excluded_words: excluded_words
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    pub fn signals(&self) -> &ListeningSignals {
        &self.signals
    }

    /// Base weight from overplay count and top rank, clamped to `[0, 10]`.
    pub fn weight(&self, track_id: &str) -> f64 {
        self.raw_weight(track_id).clamp(0.0, MAX_WEIGHT)
    }

    /// Base weight minus the artist-overplay deduction, then clamped.
    pub fn master_weight(&self, track: &Track, artist_overplay: Option<&ArtistOverplay>) -> f64 {
        let mut weight = self.raw_weight(&track.id);
        if let (Some(overplay), Some(artist_id)) = (artist_overplay, track.artist_id.as_deref()) {
            weight -= artist_penalty(overplay.occurrences(artist_id)) * self.modifier;
        }
        weight.clamp(0.0, MAX_WEIGHT)
    }

    fn raw_weight(&self, track_id: &str) -> f64 {
        let overplay = overplay_penalty(self.signals.overplay.count(track_id));
        let rank = rank_penalty(self.signals.top_ranks.rank(track_id));
        MAX_WEIGHT - (overplay + rank) * self.modifier
    }

    pub fn is_title_excluded(&self, title: &str) -> bool {
        if self.excluded_words.is_empty() {
            return false;
        }
        let title = title.to_lowercase();
        self.excluded_words.iter().any(|w| title.contains(w.as_str()))
    }

    pub fn is_blacklisted(&self, artist_name: &str) -> bool {
        self.signals.blacklist.matches(artist_name)
    }

    /// Absolute exclusions, checked before any weight is computed.
    pub fn screen(&self, track: &Track) -> Option<Decision> {
        if self.is_blacklisted(&track.artist_name) {
            Some(Decision::Blacklisted)
        } else if self.is_title_excluded(&track.title) {
            Some(Decision::TitleExcluded)
        } else {
            None
        }
    }

    /// Include with probability `weight / 10`.
    pub fn draw<R: RandomSource>(weight: f64, rng: &mut R) -> bool {
        rng.draw() < weight / MAX_WEIGHT
    }

    /// Screen, weigh and draw one track.
    ///
    /// `artist_overplay` enables the artist deduction; pass `None` for
    /// base weights only.
    pub fn decide<R: RandomSource>(
        &self,
        track: &Track,
        artist_overplay: Option<&ArtistOverplay>,
        rng: &mut R,
    ) -> Decision {
        if let Some(excluded) = self.screen(track) {
            return excluded;
        }
        let weight = self.master_weight(track, artist_overplay);
        let decision = if Self::draw(weight, rng) {
            Decision::Included { weight }
        } else {
            Decision::Dropped { weight }
        };
        log::debug!("{} -> {:?}", track.display_key(), decision);
        decision
    }
}

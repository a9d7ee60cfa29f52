pub mod engine;
pub mod master;
pub mod radio;
pub mod random;
pub mod signals;

pub use engine::{Decision, WeightedCurationEngine, MAX_WEIGHT};
pub use master::{MasterCurator, MasterOutcome, MasterSettings};
pub use radio::{RadioGenerator, RadioOutcome, RadioSettings, RADIO_TOP_TRACKS};
pub use random::RandomSource;
pub use signals::{
    ArtistAggregate, ArtistOverplay, BlacklistSet, ListeningSignals, OverplayCounter,
    SignalOptions, TopTrackRank, BLACKLIST_THRESHOLD, FREQUENT_ARTIST_THRESHOLD,
};

//! One full curation run: signals, then radio, then master.

use anyhow::Context;
use chrono::Local;
use std::sync::Arc;

use crate::catalog::MusicCatalog;
use crate::config::CurationConfig;
use crate::curation::{
    ListeningSignals, MasterCurator, MasterOutcome, RadioGenerator, RadioOutcome, RandomSource,
    WeightedCurationEngine,
};
use crate::remote::RetryPolicy;
use crate::session::CatalogSession;

#[derive(Debug)]
pub struct RunSummary {
    pub radio: RadioOutcome,
    pub master: MasterOutcome,
    pub api_calls: u64,
}

pub async fn run<R: RandomSource>(
    config: &CurationConfig,
    catalog: Arc<dyn MusicCatalog>,
    policy: RetryPolicy,
    rng: &mut R,
) -> anyhow::Result<RunSummary> {
    let session = CatalogSession::connect(catalog, policy)
        .await
        .context("Could not reach the music catalog")?;

    let today = Local::now().format("%Y-%m-%d");
    let master_id = session
        .get_or_create_playlist(
            &config.master_playlist_name,
            &format!("Generated by script - {}", today),
        )
        .await
        .with_context(|| format!("Could not prepare '{}'", config.master_playlist_name))?;
    let overplayed_id = session
        .get_or_create_playlist(&config.overplayed_playlist_name, "Generated by script")
        .await
        .with_context(|| format!("Could not prepare '{}'", config.overplayed_playlist_name))?;

    let signals = ListeningSignals::gather(&session, &overplayed_id, config.signal_options())
        .await
        .context("Could not gather listening signals")?;
    let engine = WeightedCurationEngine::new(
        signals,
        config.weight_modifier,
        &config.excluded_words,
    );

    // The radio samples artists from the master as it stood before this run.
    let radio = RadioGenerator::new(&session, &engine, config.radio_settings())
        .generate(&master_id, rng)
        .await
        .context("Radio generation failed")?;

    let master = MasterCurator::new(&session, &engine, config.master_settings())
        .curate(&master_id, rng)
        .await
        .context("Master curation failed")?;

    let api_calls = session.api_calls();
    log::info!("Total API calls made: {}", api_calls);

    Ok(RunSummary {
        radio,
        master,
        api_calls,
    })
}

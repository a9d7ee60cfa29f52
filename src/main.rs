use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::process::ExitCode;
use std::sync::Arc;

use playlistrx::catalog::SpotifyWebCatalog;
use playlistrx::cli::Args;
use playlistrx::config::CurationConfig;
use playlistrx::errors::AppError;
use playlistrx::remote::RetryPolicy;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting PlaylistRX");

    tokio::select! {
        result = run(args) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Fatal error: {:#}", e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nOperation cancelled by user");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = CurationConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    config.apply_overrides(&args)?;

    let token = config
        .access_token
        .clone()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            AppError::Auth(
                "no access token; pass --access-token or set SPOTIFY_ACCESS_TOKEN".to_string(),
            )
        })?;
    let catalog = Arc::new(SpotifyWebCatalog::new(token)?);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let summary = playlistrx::app::run(&config, catalog, RetryPolicy::default(), &mut rng).await?;
    log::info!(
        "Done: radio {} tracks, master {} tracks",
        summary.radio.tracks.len(),
        summary.master.tracks.len()
    );
    Ok(())
}

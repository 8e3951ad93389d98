#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the retrain job.

use std::path::PathBuf;

use clap::Parser;
use film_hotspots_drift::HotspotPolicy;
use film_hotspots_events::{DEFAULT_BASELINE_KEY, DEFAULT_WINDOW_LIMIT};
use film_hotspots_retrain::{RetrainOptions, load_inputs, run_retrain};
use film_hotspots_store::{ArtifactLayout, open_from_env};
use film_hotspots_tracking::tracker_from_env;

#[derive(Parser)]
#[command(
    name = "film_hotspots_retrain",
    about = "Check filming hotspots for drift and redeploy zones when the city has changed"
)]
struct Cli {
    /// Retrain and deploy regardless of drift
    #[arg(long)]
    force: bool,
    /// Number of most recent events in the current window
    #[arg(long, default_value_t = DEFAULT_WINDOW_LIMIT)]
    limit: usize,
    /// Policy override file (TOML); unset keys keep the built-in defaults
    #[arg(long, env = "HOTSPOT_POLICY_PATH")]
    policy: Option<PathBuf>,
    /// Evaluate and record the run without persisting any artifact
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let policy = HotspotPolicy::load(cli.policy.as_deref())?;
    log::info!(
        "Policy: eps {} km, min_samples {}, thresholds {:?}",
        policy.clustering.eps_km,
        policy.clustering.min_samples,
        policy.drift
    );

    let store = open_from_env().await?;
    let layout = ArtifactLayout::from_env();
    let tracker = tracker_from_env();
    let baseline_key =
        std::env::var("BASELINE_KEY").unwrap_or_else(|_| DEFAULT_BASELINE_KEY.to_string());
    let events_db = std::env::var("EVENTS_DB_PATH").ok().map(PathBuf::from);

    let inputs = load_inputs(
        store.as_ref(),
        &baseline_key,
        events_db.as_deref(),
        cli.limit,
    )
    .await?;

    let options = RetrainOptions {
        force: cli.force,
        dry_run: cli.dry_run,
        baseline_key,
    };
    let outcome = run_retrain(
        inputs,
        &policy,
        store.as_ref(),
        &layout,
        tracker.as_ref(),
        &options,
    )
    .await?;

    match &outcome.keys {
        Some(keys) => log::info!(
            "Run {} deployed {} zones: {} ({})",
            outcome.run_id,
            outcome.candidate_metrics.n_zones,
            keys.zones_key,
            keys.model_key
        ),
        None => log::info!(
            "Run {} finished without deploy ({})",
            outcome.run_id,
            outcome.decision
        ),
    }

    Ok(())
}

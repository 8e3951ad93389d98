#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The retrain job.
//!
//! One invocation clusters the baseline and current windows, compares their
//! metrics through the retrain gate, clusters the combined candidate set,
//! records the run, and deploys the candidate zones when the gate opens.

use std::path::Path;

use chrono::Utc;
use film_hotspots_drift::{DriftVerdict, HotspotPolicy, RetrainReason, evaluate_retrain};
use film_hotspots_events::EventsError;
use film_hotspots_store::{ArtifactLayout, ArtifactStore, StoreError, save_model, save_zones};
use film_hotspots_tracking::{ExperimentTracker, RunRecord, new_run_id};
use film_hotspots_zones::{compute_zone_metrics, fit, zone_circles};
use film_hotspots_zones_models::{MetricsSnapshot, PointSet, ZoneArtifact};

/// Run name used for every retrain run.
pub const RUN_NAME: &str = "city_evolution_retrain";

/// Errors that can abort a retrain.
#[derive(Debug, thiserror::Error)]
pub enum RetrainError {
    /// Neither window produced any points.
    #[error("No input: both baseline and current windows are unavailable")]
    NoInput,

    /// Artifact store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Event source failure.
    #[error(transparent)]
    Events(#[from] EventsError),
}

/// The two event windows. `None` means the window could not be obtained.
#[derive(Debug, Clone, Default)]
pub struct RetrainInputs {
    /// Reference window.
    pub baseline: Option<PointSet>,
    /// Most recent window.
    pub current: Option<PointSet>,
}

/// Per-invocation switches.
#[derive(Debug, Clone, Default)]
pub struct RetrainOptions {
    /// Retrain regardless of drift.
    pub force: bool,
    /// Evaluate and record, but never persist artifacts.
    pub dry_run: bool,
    /// Store key of the baseline snapshot, recorded with the run.
    pub baseline_key: String,
}

/// Keys of the artifacts written by a deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedKeys {
    /// Zone document key.
    pub zones_key: String,
    /// Model object key.
    pub model_key: String,
}

/// What one invocation decided and did.
#[derive(Debug, Clone)]
pub struct RetrainOutcome {
    /// Run id, also used in artifact keys.
    pub run_id: String,
    /// Why the gate opened or stayed shut.
    pub decision: RetrainReason,
    /// Metrics of the combined candidate clustering.
    pub candidate_metrics: MetricsSnapshot,
    /// Artifacts written, if any.
    pub keys: Option<DeployedKeys>,
}

impl RetrainOutcome {
    /// The drift verdict, when the policy was consulted.
    #[must_use]
    pub const fn verdict(&self) -> Option<&DriftVerdict> {
        self.decision.verdict()
    }
}

/// Loads both windows.
///
/// A missing baseline object or an absent events database makes that
/// window unavailable. Any other failure is returned.
///
/// # Errors
///
/// Returns [`RetrainError`] on store transport failures or database query
/// failures.
pub async fn load_inputs(
    store: &dyn ArtifactStore,
    baseline_key: &str,
    events_db: Option<&Path>,
    limit: usize,
) -> Result<RetrainInputs, RetrainError> {
    log::info!("Loading baseline...");
    let baseline = film_hotspots_events::baseline::load_baseline(store, baseline_key).await?;

    log::info!("Loading current events...");
    let current = match events_db {
        Some(path) if path.exists() => {
            let conn = film_hotspots_events::current::open_read_only(path)?;
            Some(film_hotspots_events::current::load_current_window(
                &conn, limit,
            )?)
        }
        Some(path) => {
            log::warn!("Events database {} does not exist", path.display());
            None
        }
        None => {
            log::warn!("EVENTS_DB_PATH not set, current window unavailable");
            None
        }
    };

    Ok(RetrainInputs { baseline, current })
}

fn window_metrics(name: &str, points: &PointSet, policy: &HotspotPolicy) -> MetricsSnapshot {
    log::info!("Clustering {name} window ({} points)", points.len());
    let clustering = fit(points, &policy.clustering);
    let metrics = compute_zone_metrics(&clustering.assignment);
    log::info!(
        "  {name}: {} zones, {:.1} films/zone, {:.1} m mean radius",
        metrics.n_zones,
        metrics.mean_films_per_zone,
        metrics.mean_zone_radius_m
    );
    metrics
}

const fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

/// Runs one retrain cycle.
///
/// Empty windows count as unavailable. The retrain gate fails open, so a
/// missing window forces a deploy from whatever points remain.
///
/// # Errors
///
/// Returns [`RetrainError::NoInput`] if neither window has points, or a
/// store error if persisting the artifacts fails. Tracking failures are
/// logged and do not abort the run.
pub async fn run_retrain(
    inputs: RetrainInputs,
    policy: &HotspotPolicy,
    store: &dyn ArtifactStore,
    layout: &ArtifactLayout,
    tracker: &dyn ExperimentTracker,
    options: &RetrainOptions,
) -> Result<RetrainOutcome, RetrainError> {
    let baseline = inputs.baseline.filter(|p| !p.is_empty());
    let current = inputs.current.filter(|p| !p.is_empty());

    let candidate_points = match (&baseline, &current) {
        (Some(b), Some(c)) => b.concat(c),
        (Some(only), None) | (None, Some(only)) => only.clone(),
        (None, None) => return Err(RetrainError::NoInput),
    };

    let baseline_metrics = baseline
        .as_ref()
        .map(|p| window_metrics("baseline", p, policy));
    let current_metrics = current
        .as_ref()
        .map(|p| window_metrics("current", p, policy));

    log::info!(
        "Clustering candidate set ({} points)",
        candidate_points.len()
    );
    let candidate = fit(&candidate_points, &policy.clustering);
    let candidate_metrics = compute_zone_metrics(&candidate.assignment);

    let decision = evaluate_retrain(
        &policy.drift_policy(),
        current_metrics.as_ref(),
        baseline_metrics.as_ref(),
        options.force,
    );
    log::info!("Retrain decision: {decision}");

    let run_id = match tracker.start_run(RUN_NAME).await {
        Ok(id) => id,
        Err(e) => {
            let id = new_run_id();
            log::warn!("Failed to start tracked run ({e}), using local run id {id}");
            id
        }
    };

    let mut record = RunRecord::new();
    record.snapshot("", &candidate_metrics);
    if let Some(metrics) = &baseline_metrics {
        record.snapshot("baseline_", metrics);
    }
    if let Some(metrics) = &current_metrics {
        record.snapshot("current_", metrics);
    }
    record
        .param("eps_km", policy.clustering.eps_km.to_string())
        .param("min_samples", policy.clustering.min_samples.to_string())
        .param("drift", flag(decision.should_retrain()))
        .param("forced", flag(options.force))
        .param("reason", decision.to_string())
        .param("baseline_key", options.baseline_key.as_str());

    let keys = if decision.should_retrain() && !options.dry_run {
        log::info!("City evolved, deploying new zones");
        let model_key = save_model(store, layout, &run_id, &candidate.model).await?;

        let artifact = ZoneArtifact {
            run_id: run_id.clone(),
            created_at_utc: Utc::now(),
            params: policy.clustering,
            metrics: candidate_metrics,
            zones: zone_circles(&candidate.assignment),
        };
        let zones_key = save_zones(store, layout, &artifact).await?;

        record
            .param("zones_s3_path", zones_key.as_str())
            .param("model_s3_path", model_key.as_str());

        Some(DeployedKeys {
            zones_key,
            model_key,
        })
    } else if decision.should_retrain() {
        log::info!("Dry run, skipping deploy");
        None
    } else {
        log::info!("City stable, no deploy");
        None
    };

    if let Err(e) = tracker.finish_run(&run_id, &record).await {
        log::warn!("Failed to record run {run_id}: {e}");
    }

    Ok(RetrainOutcome {
        run_id,
        decision,
        candidate_metrics,
        keys,
    })
}

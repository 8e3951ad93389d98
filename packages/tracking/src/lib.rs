#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Experiment run tracking.
//!
//! Each retrain invocation opens one run, then closes it with a
//! [`RunRecord`] of metrics and params. Runs go to an MLflow tracking
//! server when `MLFLOW_TRACKING_URI` is set ([`mlflow::MlflowTracker`]),
//! otherwise to a local JSON-lines file ([`jsonl::JsonlTracker`]).
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |---|---|---|
//! | `MLFLOW_TRACKING_URI` | No | MLflow server base URL |
//! | `MLFLOW_EXPERIMENT` | No | Experiment name (default `cinematic-paris-hotspots`) |
//! | `HOTSPOT_RUN_LOG` | No | JSON-lines path when MLflow is unset (default `data/runs.jsonl`) |

pub mod jsonl;
pub mod mlflow;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use film_hotspots_zones_models::MetricsSnapshot;
use serde::{Deserialize, Serialize};

/// Default MLflow experiment name.
pub const DEFAULT_EXPERIMENT: &str = "cinematic-paris-hotspots";

/// Default JSON-lines run log.
pub const DEFAULT_RUN_LOG: &str = "data/runs.jsonl";

/// Errors that can occur while recording runs.
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The tracking server answered with an error status.
    #[error("Tracking API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or error message.
        message: String,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error writing the local run log.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metrics and params logged for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Numeric metrics by name.
    pub metrics: BTreeMap<String, f64>,
    /// String params by name.
    pub params: BTreeMap<String, String>,
}

impl RunRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a metric.
    pub fn metric(&mut self, key: impl Into<String>, value: f64) -> &mut Self {
        self.metrics.insert(key.into(), value);
        self
    }

    /// Sets a param.
    pub fn param(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Logs every field of a snapshot, each name prefixed with `prefix`.
    pub fn snapshot(&mut self, prefix: &str, snapshot: &MetricsSnapshot) -> &mut Self {
        for (name, value) in snapshot.as_pairs() {
            self.metric(format!("{prefix}{name}"), value);
        }
        self
    }
}

/// A sink for experiment runs.
#[async_trait]
pub trait ExperimentTracker: Send + Sync {
    /// Opens a run and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError`] if the backend rejects the run.
    async fn start_run(&self, run_name: &str) -> Result<String, TrackingError>;

    /// Logs `record` to the run and marks it finished.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError`] if the backend rejects the write.
    async fn finish_run(&self, run_id: &str, record: &RunRecord) -> Result<(), TrackingError>;
}

/// A fresh run id (UUID v4, simple form).
#[must_use]
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Opens the tracker selected by the environment.
#[must_use]
pub fn tracker_from_env() -> Arc<dyn ExperimentTracker> {
    match std::env::var("MLFLOW_TRACKING_URI") {
        Ok(uri) if !uri.trim().is_empty() => {
            let experiment = std::env::var("MLFLOW_EXPERIMENT")
                .unwrap_or_else(|_| DEFAULT_EXPERIMENT.to_string());
            log::info!("Tracking runs in MLflow at {uri} (experiment {experiment})");
            Arc::new(mlflow::MlflowTracker::new(&uri, &experiment))
        }
        _ => {
            let path = PathBuf::from(
                std::env::var("HOTSPOT_RUN_LOG").unwrap_or_else(|_| DEFAULT_RUN_LOG.to_string()),
            );
            log::info!("Tracking runs in {}", path.display());
            Arc::new(jsonl::JsonlTracker::new(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_metrics_are_prefixed() {
        let mut record = RunRecord::new();
        record.snapshot(
            "baseline_",
            &MetricsSnapshot {
                n_zones: 3,
                mean_films_per_zone: 12.5,
                mean_zone_radius_m: 80.0,
            },
        );
        record.snapshot("", &MetricsSnapshot::EMPTY);

        assert_eq!(record.metrics.len(), 6);
        assert!((record.metrics["baseline_n_zones"] - 3.0).abs() < f64::EPSILON);
        assert!((record.metrics["baseline_mean_films_per_zone"] - 12.5).abs() < f64::EPSILON);
        assert!(record.metrics["mean_zone_radius_m"].abs() < f64::EPSILON);
    }

    #[test]
    fn later_params_overwrite() {
        let mut record = RunRecord::new();
        record
            .param("eps_km", 0.1_f64.to_string())
            .param("baseline_key", "monitoring/reference/baseline.csv")
            .param("drift", "0")
            .param("drift", "1");

        assert_eq!(record.params.len(), 3);
        assert_eq!(record.params["eps_km"], "0.1");
        assert_eq!(record.params["drift"], "1");
    }

    #[test]
    fn run_ids_are_simple_uuids() {
        let id = new_run_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_run_id());
    }
}

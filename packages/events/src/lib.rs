#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filming event sources.
//!
//! The baseline window is a CSV snapshot kept in the artifact store
//! ([`baseline::load_baseline`]); the current window is the most recent
//! rows of the `filming_events` table in a `DuckDB` file
//! ([`current::load_current_window`]). Both produce a [`PointSet`].
//!
//! [`PointSet`]: film_hotspots_zones_models::PointSet

pub mod baseline;
pub mod csv_points;
pub mod current;

use film_hotspots_store::StoreError;

/// Default baseline snapshot key when `BASELINE_KEY` is unset.
pub const DEFAULT_BASELINE_KEY: &str = "monitoring/reference/baseline_2016_2023.csv";

/// Default number of most recent events in the current window.
pub const DEFAULT_WINDOW_LIMIT: usize = 2000;

/// Errors that can occur while reading events.
#[derive(Debug, thiserror::Error)]
pub enum EventsError {
    /// CSV reader error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required CSV column is absent.
    #[error("Missing column: {name}")]
    MissingColumn {
        /// Column name.
        name: String,
    },

    /// `DuckDB` query error.
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    /// Artifact store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

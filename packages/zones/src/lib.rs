#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zone extraction for film hotspots.
//!
//! Raw coordinates go through [`cluster::fit`] (DBSCAN, haversine metric)
//! to get a cluster assignment. The assignment feeds
//! [`geometry::zone_circles`] for the zone descriptors that get deployed,
//! and [`metrics::compute_zone_metrics`] for the snapshot the drift policy
//! compares. [`classify::nearest_zone`] answers point queries against a
//! deployed zone set.

pub mod classify;
pub mod cluster;
pub mod geometry;
pub mod metrics;

pub use classify::nearest_zone;
pub use cluster::{Clustering, CoreSample, ZoneModel, fit, fit_predict};
pub use geometry::{zone_circle, zone_circles};
pub use metrics::{compute_zone_metrics, metrics_from_zones};

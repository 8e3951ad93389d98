#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Drift detection and the retrain gate.
//!
//! [`policy::DriftPolicy`] compares a current metrics snapshot against a
//! baseline. [`decision::evaluate_retrain`] wraps it with the force
//! override and the fail-open rule for missing snapshots; it is the only
//! path by which the retrain job decides to deploy.

pub mod config;
pub mod decision;
pub mod policy;

pub use config::{ConfigError, HotspotPolicy};
pub use decision::{RetrainReason, decide, evaluate_retrain};
pub use policy::{DriftPolicy, DriftThresholds, DriftVerdict, rel_change};

//! Policy configuration.
//!
//! The defaults live in `policy.toml`, embedded at compile time via
//! [`include_str!`]. An override file only needs the keys it changes;
//! everything else falls back to the embedded values.

use std::path::Path;

use film_hotspots_zones_models::ClusteringParams;
use serde::Deserialize;

use crate::policy::{DriftPolicy, DriftThresholds};

/// Default policy, embedded at compile time.
const DEFAULT_POLICY_TOML: &str = include_str!("../policy.toml");

/// Errors that can occur while loading a policy.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The override file could not be read.
    #[error("Failed to read policy file {path}: {source}")]
    Read {
        /// Path of the override file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML did not parse.
    #[error("Failed to parse policy: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid policy: {message}")]
    Invalid {
        /// What was wrong.
        message: String,
    },
}

/// Clustering parameters and drift thresholds for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HotspotPolicy {
    /// Parameters for every clustering pass.
    pub clustering: ClusteringParams,
    /// Thresholds for the drift test.
    pub drift: DriftThresholds,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyFile {
    #[serde(default)]
    clustering: ClusteringSection,
    #[serde(default)]
    drift: DriftSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClusteringSection {
    eps_km: Option<f64>,
    min_samples: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DriftSection {
    radius: Option<f64>,
    films_per_zone: Option<f64>,
    n_zones: Option<f64>,
}

impl HotspotPolicy {
    /// Parses a policy from TOML, filling unspecified keys from `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML and
    /// [`ConfigError::Invalid`] on out-of-range values.
    pub fn from_toml_str(toml_str: &str, base: &Self) -> Result<Self, ConfigError> {
        let file: PolicyFile = toml::from_str(toml_str)?;

        let policy = Self {
            clustering: ClusteringParams {
                eps_km: file.clustering.eps_km.unwrap_or(base.clustering.eps_km),
                min_samples: file
                    .clustering
                    .min_samples
                    .unwrap_or(base.clustering.min_samples),
            },
            drift: DriftThresholds {
                radius: file.drift.radius.unwrap_or(base.drift.radius),
                films_per_zone: file
                    .drift
                    .films_per_zone
                    .unwrap_or(base.drift.films_per_zone),
                n_zones: file.drift.n_zones.unwrap_or(base.drift.n_zones),
            },
        };

        policy.validate()?;
        Ok(policy)
    }

    /// Parses the embedded default policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the embedded TOML is malformed.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(DEFAULT_POLICY_TOML, &Self::default())
    }

    /// Loads the embedded policy, then applies the override file at `path`
    /// if one is given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the override cannot be read, or a
    /// parse/validation error from either document.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let embedded = Self::embedded()?;
        let Some(path) = path else {
            return Ok(embedded);
        };

        log::info!("Loading policy overrides from {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&contents, &embedded)
    }

    /// The drift policy built from these thresholds.
    #[must_use]
    pub const fn drift_policy(&self) -> DriftPolicy {
        DriftPolicy::new(self.drift)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| {
            Err(ConfigError::Invalid {
                message: message.to_string(),
            })
        };

        if !(self.clustering.eps_km.is_finite() && self.clustering.eps_km > 0.0) {
            return invalid("clustering.eps_km must be a positive number");
        }
        if self.clustering.min_samples == 0 {
            return invalid("clustering.min_samples must be at least 1");
        }
        for (name, value) in [
            ("drift.radius", self.drift.radius),
            ("drift.films_per_zone", self.drift.films_per_zone),
            ("drift.n_zones", self.drift.n_zones),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return invalid(&format!("{name} must be a non-negative number"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_policy_matches_defaults() {
        assert_eq!(HotspotPolicy::embedded().unwrap(), HotspotPolicy::default());
    }

    #[test]
    fn partial_override_keeps_other_values() {
        let policy = HotspotPolicy::from_toml_str(
            "[drift]\nradius = 0.5\n",
            &HotspotPolicy::default(),
        )
        .unwrap();
        assert!((policy.drift.radius - 0.5).abs() < f64::EPSILON);
        assert!((policy.drift.n_zones - 0.20).abs() < f64::EPSILON);
        assert_eq!(policy.clustering, ClusteringParams::default());
    }

    #[test]
    fn clustering_override() {
        let policy = HotspotPolicy::from_toml_str(
            "[clustering]\nmin_samples = 5\n",
            &HotspotPolicy::default(),
        )
        .unwrap();
        assert_eq!(policy.clustering.min_samples, 5);
        assert!((policy.clustering.eps_km - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_bad_values() {
        let base = HotspotPolicy::default();
        assert!(matches!(
            HotspotPolicy::from_toml_str("[clustering]\neps_km = 0.0\n", &base),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            HotspotPolicy::from_toml_str("[clustering]\nmin_samples = 0\n", &base),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            HotspotPolicy::from_toml_str("[drift]\nn_zones = -0.1\n", &base),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            HotspotPolicy::from_toml_str("[clustering]\nepsilon = 1.0\n", &HotspotPolicy::default()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_override_file() {
        let dir = std::env::temp_dir().join("film_hotspots_policy_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("policy.toml");
        std::fs::write(&path, "[clustering]\neps_km = 0.2\n").unwrap();

        let policy = HotspotPolicy::load(Some(&path)).unwrap();
        assert!((policy.clustering.eps_km - 0.2).abs() < f64::EPSILON);

        assert!(matches!(
            HotspotPolicy::load(Some(&dir.join("missing.toml"))),
            Err(ConfigError::Read { .. })
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }
}

//! Drift test between a current and a baseline metrics snapshot.

use film_hotspots_zones_models::MetricsSnapshot;
use serde::{Deserialize, Serialize};

/// Relative-change thresholds above which a metric counts as drifted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftThresholds {
    /// Threshold on `mean_zone_radius_m`.
    pub radius: f64,
    /// Threshold on `mean_films_per_zone`.
    pub films_per_zone: f64,
    /// Threshold on `n_zones`.
    pub n_zones: f64,
}

impl Default for DriftThresholds {
    fn default() -> Self {
        Self {
            radius: 0.30,
            films_per_zone: 0.30,
            n_zones: 0.20,
        }
    }
}

/// Outcome of one drift evaluation, with the underlying relative changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftVerdict {
    /// Whether the city has drifted.
    pub drifted: bool,
    /// Whether the current window has no zones at all.
    pub collapsed: bool,
    /// Relative change in mean zone radius.
    pub radius_change: f64,
    /// Relative change in mean films per zone.
    pub films_per_zone_change: f64,
    /// Relative change in zone count.
    pub n_zones_change: f64,
}

/// `|current - base| / base`, or exactly `1.0` when `base` is zero.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn rel_change(current: f64, base: f64) -> f64 {
    if base == 0.0 {
        return 1.0;
    }
    (current - base).abs() / base
}

/// Compares snapshots against a fixed set of thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriftPolicy {
    thresholds: DriftThresholds,
}

impl DriftPolicy {
    /// Creates a policy with the given thresholds.
    #[must_use]
    pub const fn new(thresholds: DriftThresholds) -> Self {
        Self { thresholds }
    }

    /// The thresholds in use.
    #[must_use]
    pub const fn thresholds(&self) -> &DriftThresholds {
        &self.thresholds
    }

    /// Evaluates `current` against `baseline`.
    ///
    /// The city has drifted if the current window has no zones, or if any
    /// relative change strictly exceeds its threshold.
    #[must_use]
    pub fn evaluate(&self, current: &MetricsSnapshot, baseline: &MetricsSnapshot) -> DriftVerdict {
        #[allow(clippy::cast_precision_loss)]
        let n_zones_change = rel_change(current.n_zones as f64, baseline.n_zones as f64);
        let radius_change = rel_change(current.mean_zone_radius_m, baseline.mean_zone_radius_m);
        let films_per_zone_change =
            rel_change(current.mean_films_per_zone, baseline.mean_films_per_zone);

        let collapsed = current.n_zones == 0;
        let drifted = collapsed
            || radius_change > self.thresholds.radius
            || films_per_zone_change > self.thresholds.films_per_zone
            || n_zones_change > self.thresholds.n_zones;

        DriftVerdict {
            drifted,
            collapsed,
            radius_change,
            films_per_zone_change,
            n_zones_change,
        }
    }

    /// Shorthand for `evaluate(..).drifted`.
    #[must_use]
    pub fn is_city_drifted(&self, current: &MetricsSnapshot, baseline: &MetricsSnapshot) -> bool {
        self.evaluate(current, baseline).drifted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: MetricsSnapshot = MetricsSnapshot {
        n_zones: 10,
        mean_films_per_zone: 40.0,
        mean_zone_radius_m: 300.0,
    };

    fn drifted(current: &MetricsSnapshot) -> bool {
        DriftPolicy::default().is_city_drifted(current, &BASE)
    }

    #[test]
    fn zone_radius_drift_detected() {
        let current = MetricsSnapshot {
            mean_zone_radius_m: 500.0,
            ..BASE
        };
        let verdict = DriftPolicy::default().evaluate(&current, &BASE);
        assert!(verdict.drifted);
        assert!((verdict.radius_change - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn films_per_zone_drift_detected() {
        assert!(drifted(&MetricsSnapshot {
            mean_films_per_zone: 60.0,
            ..BASE
        }));
    }

    #[test]
    fn n_zones_drift_detected() {
        assert!(drifted(&MetricsSnapshot { n_zones: 13, ..BASE }));
    }

    #[test]
    fn city_collapse_detected() {
        let verdict = DriftPolicy::default().evaluate(&MetricsSnapshot { n_zones: 0, ..BASE }, &BASE);
        assert!(verdict.drifted);
        assert!(verdict.collapsed);
    }

    #[test]
    fn small_changes_are_not_drift() {
        let current = MetricsSnapshot {
            n_zones: 11,
            mean_films_per_zone: 45.0,
            mean_zone_radius_m: 350.0,
        };
        let verdict = DriftPolicy::default().evaluate(&current, &BASE);
        assert!(!verdict.drifted);
        assert!((verdict.n_zones_change - 0.1).abs() < 1e-12);
        assert!((verdict.films_per_zone_change - 0.125).abs() < 1e-12);
        assert!((verdict.radius_change - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn change_equal_to_threshold_is_not_drift() {
        assert!(!drifted(&MetricsSnapshot { n_zones: 12, ..BASE }));
    }

    #[test]
    fn zero_baseline_forces_drift() {
        let current = MetricsSnapshot {
            n_zones: 5,
            mean_films_per_zone: 12.0,
            mean_zone_radius_m: 80.0,
        };
        let verdict = DriftPolicy::default().evaluate(&current, &MetricsSnapshot::EMPTY);
        assert!(verdict.drifted);
        assert!((verdict.n_zones_change - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rel_change_edge_cases() {
        assert!((rel_change(3.5, 0.0) - 1.0).abs() < f64::EPSILON);
        assert!((rel_change(-2.0, 0.0) - 1.0).abs() < f64::EPSILON);
        assert!(rel_change(42.0, 42.0).abs() < f64::EPSILON);
        assert!((rel_change(30.0, 40.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let strict = DriftPolicy::new(DriftThresholds {
            radius: 0.05,
            ..DriftThresholds::default()
        });
        let current = MetricsSnapshot {
            mean_zone_radius_m: 330.0,
            ..BASE
        };
        assert!(strict.is_city_drifted(&current, &BASE));
        assert!(!DriftPolicy::default().is_city_drifted(&current, &BASE));
    }
}

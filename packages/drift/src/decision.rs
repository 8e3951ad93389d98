//! The single gate in front of train-and-deploy.

use film_hotspots_zones_models::MetricsSnapshot;

use crate::policy::{DriftPolicy, DriftVerdict};

/// Why the gate opened or stayed shut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetrainReason {
    /// The caller forced a retrain.
    Forced,
    /// No current snapshot was available.
    MissingCurrent,
    /// No baseline snapshot was available.
    MissingBaseline,
    /// The drift policy flagged the city.
    Drifted(DriftVerdict),
    /// The drift policy found the city stable.
    Stable(DriftVerdict),
}

impl RetrainReason {
    /// Whether this reason calls for a retrain.
    #[must_use]
    pub const fn should_retrain(&self) -> bool {
        !matches!(self, Self::Stable(_))
    }

    /// The drift verdict, when the policy was actually consulted.
    #[must_use]
    pub const fn verdict(&self) -> Option<&DriftVerdict> {
        match self {
            Self::Drifted(v) | Self::Stable(v) => Some(v),
            Self::Forced | Self::MissingCurrent | Self::MissingBaseline => None,
        }
    }
}

impl std::fmt::Display for RetrainReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forced => write!(f, "forced"),
            Self::MissingCurrent => write!(f, "current snapshot unavailable"),
            Self::MissingBaseline => write!(f, "baseline snapshot unavailable"),
            Self::Drifted(v) if v.collapsed => write!(f, "city collapsed (no zones)"),
            Self::Drifted(v) => write!(
                f,
                "drifted (radius {:.3}, films/zone {:.3}, zones {:.3})",
                v.radius_change, v.films_per_zone_change, v.n_zones_change
            ),
            Self::Stable(_) => write!(f, "stable"),
        }
    }
}

/// Decides whether to retrain, and why.
///
/// `force` always wins. A missing snapshot cannot be trusted as "no
/// drift", so either one being absent opens the gate. Otherwise the drift
/// policy decides.
#[must_use]
pub fn evaluate_retrain(
    policy: &DriftPolicy,
    current: Option<&MetricsSnapshot>,
    baseline: Option<&MetricsSnapshot>,
    force: bool,
) -> RetrainReason {
    if force {
        return RetrainReason::Forced;
    }
    let Some(current) = current else {
        return RetrainReason::MissingCurrent;
    };
    let Some(baseline) = baseline else {
        return RetrainReason::MissingBaseline;
    };

    let verdict = policy.evaluate(current, baseline);
    if verdict.drifted {
        RetrainReason::Drifted(verdict)
    } else {
        RetrainReason::Stable(verdict)
    }
}

/// Boolean form of [`evaluate_retrain`].
#[must_use]
pub fn decide(
    policy: &DriftPolicy,
    current: Option<&MetricsSnapshot>,
    baseline: Option<&MetricsSnapshot>,
    force: bool,
) -> bool {
    evaluate_retrain(policy, current, baseline, force).should_retrain()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: MetricsSnapshot = MetricsSnapshot {
        n_zones: 10,
        mean_films_per_zone: 40.0,
        mean_zone_radius_m: 300.0,
    };

    fn policy() -> DriftPolicy {
        DriftPolicy::default()
    }

    #[test]
    fn drift_triggers_retrain() {
        let current = MetricsSnapshot {
            mean_zone_radius_m: 500.0,
            ..BASE
        };
        assert!(decide(&policy(), Some(&current), Some(&BASE), false));
    }

    #[test]
    fn force_triggers_retrain_even_without_drift() {
        assert!(decide(&policy(), Some(&BASE), Some(&BASE), true));
        assert!(decide(&policy(), None, None, true));
        assert_eq!(
            evaluate_retrain(&policy(), Some(&BASE), Some(&BASE), true),
            RetrainReason::Forced
        );
    }

    #[test]
    fn missing_current_triggers_retrain() {
        assert!(decide(&policy(), None, Some(&BASE), false));
        assert_eq!(
            evaluate_retrain(&policy(), None, Some(&BASE), false),
            RetrainReason::MissingCurrent
        );
    }

    #[test]
    fn missing_baseline_triggers_retrain() {
        assert!(decide(&policy(), Some(&BASE), None, false));
        assert_eq!(
            evaluate_retrain(&policy(), Some(&BASE), None, false),
            RetrainReason::MissingBaseline
        );
    }

    #[test]
    fn no_drift_returns_false() {
        let current = MetricsSnapshot {
            n_zones: 10,
            mean_films_per_zone: 44.0,
            mean_zone_radius_m: 320.0,
        };
        let reason = evaluate_retrain(&policy(), Some(&current), Some(&BASE), false);
        assert!(!reason.should_retrain());
        assert!(reason.verdict().is_some());
        assert_eq!(reason.to_string(), "stable");
    }

    #[test]
    fn collapse_is_reported() {
        let reason = evaluate_retrain(&policy(), Some(&MetricsSnapshot::EMPTY), Some(&BASE), false);
        assert!(reason.should_retrain());
        assert_eq!(reason.to_string(), "city collapsed (no zones)");
    }
}

//! City-stability metrics.
//!
//! The per-zone radius is the same routine the geometry builder persists
//! ([`crate::geometry::zone_circles`]), so the logged mean radius and the
//! deployed zone radii can never disagree.

use film_hotspots_zones_models::{ClusterAssignment, MetricsSnapshot, ZoneDescriptor};

use crate::geometry::zone_circles;

/// Reduces a cluster assignment to a [`MetricsSnapshot`].
///
/// With no non-noise points this is [`MetricsSnapshot::EMPTY`].
#[must_use]
pub fn compute_zone_metrics(assignment: &ClusterAssignment) -> MetricsSnapshot {
    metrics_from_zones(&zone_circles(assignment))
}

/// Reduces already-built zones to a [`MetricsSnapshot`].
#[must_use]
pub fn metrics_from_zones(zones: &[ZoneDescriptor]) -> MetricsSnapshot {
    if zones.is_empty() {
        return MetricsSnapshot::EMPTY;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = zones.len() as f64;
    #[allow(clippy::cast_precision_loss)]
    let total_points = zones.iter().map(|z| z.n_points).sum::<usize>() as f64;
    let total_radius: f64 = zones.iter().map(|z| z.radius_m).sum();

    MetricsSnapshot {
        n_zones: zones.len(),
        mean_films_per_zone: total_points / n,
        mean_zone_radius_m: total_radius / n,
    }
}

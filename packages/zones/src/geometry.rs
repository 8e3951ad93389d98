//! Circular zone descriptors from a cluster assignment.

use film_hotspots_geo::{Coordinate, distances_to, mean_center};
use film_hotspots_zones_models::{ClusterAssignment, ZoneDescriptor};

/// Builds one zone per non-noise cluster, ascending by cluster id.
///
/// An assignment with only noise (or no points) yields no zones.
#[must_use]
pub fn zone_circles(assignment: &ClusterAssignment) -> Vec<ZoneDescriptor> {
    assignment
        .members_by_cluster()
        .into_iter()
        .filter_map(|(cluster_id, members)| zone_circle(cluster_id, &members))
        .collect()
}

/// Centroid (degree-space mean) and enclosing radius of one cluster.
///
/// Returns `None` for an empty member list.
#[must_use]
pub fn zone_circle(cluster_id: i32, members: &[Coordinate]) -> Option<ZoneDescriptor> {
    let center = mean_center(members)?;
    let radius_m = distances_to(members, center)
        .into_iter()
        .fold(0.0_f64, f64::max);

    Some(ZoneDescriptor {
        cluster_id,
        lat: center.lat,
        lon: center.lon,
        radius_m,
        n_points: members.len(),
    })
}

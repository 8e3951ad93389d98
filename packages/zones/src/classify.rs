//! Nearest-zone lookup for the serving side.

use film_hotspots_geo::{Coordinate, haversine_m};
use film_hotspots_zones_models::{HotspotLookup, NearestZone, ZoneDescriptor};

/// Finds the zone whose centroid is nearest to `query` and tests whether
/// `query` falls inside its radius (boundary inclusive).
///
/// Ties go to the zone listed first. An empty zone list is a normal state
/// (nothing deployed yet, or a collapsed city) and yields
/// [`HotspotLookup::NoZonesAvailable`].
#[must_use]
pub fn nearest_zone(query: Coordinate, zones: &[ZoneDescriptor]) -> HotspotLookup {
    let mut best: Option<(&ZoneDescriptor, f64)> = None;

    for zone in zones {
        let d = haversine_m(query, zone.center());
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((zone, d));
        }
    }

    best.map_or(HotspotLookup::NoZonesAvailable, |(zone, distance_m)| {
        HotspotLookup::Nearest(NearestZone {
            cluster_id: zone.cluster_id,
            distance_m,
            is_hotspot: distance_m <= zone.radius_m,
            radius_m: zone.radius_m,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(cluster_id: i32, lat: f64, lon: f64, radius_m: f64) -> ZoneDescriptor {
        ZoneDescriptor {
            cluster_id,
            lat,
            lon,
            radius_m,
            n_points: 10,
        }
    }

    fn expect_nearest(lookup: HotspotLookup) -> NearestZone {
        match lookup {
            HotspotLookup::Nearest(n) => n,
            HotspotLookup::NoZonesAvailable => panic!("expected a nearest zone"),
        }
    }

    #[test]
    fn empty_zone_set_is_unavailable() {
        assert_eq!(
            nearest_zone(Coordinate::new(48.85, 2.35), &[]),
            HotspotLookup::NoZonesAvailable
        );
    }

    #[test]
    fn query_at_centroid_is_hotspot() {
        let zones = [zone(7, 48.85, 2.35, 0.0)];
        let n = expect_nearest(nearest_zone(Coordinate::new(48.85, 2.35), &zones));
        assert_eq!(n.cluster_id, 7);
        assert!(n.distance_m.abs() < f64::EPSILON);
        assert!(n.is_hotspot);
    }

    #[test]
    fn picks_minimum_distance() {
        let zones = [
            zone(0, 48.90, 2.40, 50.0),
            zone(1, 48.8501, 2.3501, 50.0),
            zone(2, 48.80, 2.30, 50.0),
        ];
        let n = expect_nearest(nearest_zone(Coordinate::new(48.85, 2.35), &zones));
        assert_eq!(n.cluster_id, 1);
        assert!(n.is_hotspot);
        assert!((n.radius_m - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn outside_radius_is_not_hotspot() {
        let zones = [zone(0, 48.86, 2.35, 100.0)];
        let n = expect_nearest(nearest_zone(Coordinate::new(48.85, 2.35), &zones));
        assert!(n.distance_m > 1_000.0);
        assert!(!n.is_hotspot);
    }

    #[test]
    fn boundary_is_inclusive() {
        let query = Coordinate::new(48.85, 2.35);
        let center = zone(0, 48.851, 2.35, 0.0);
        let exact = haversine_m(query, center.center());
        let zones = [zone(0, 48.851, 2.35, exact)];
        assert!(expect_nearest(nearest_zone(query, &zones)).is_hotspot);
    }

    #[test]
    fn ties_go_to_first_zone() {
        let zones = [zone(5, 48.85, 2.35, 10.0), zone(3, 48.85, 2.35, 10.0)];
        let n = expect_nearest(nearest_zone(Coordinate::new(48.851, 2.35), &zones));
        assert_eq!(n.cluster_id, 5);
    }
}

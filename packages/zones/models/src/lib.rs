#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types shared by the clustering pipeline, the artifact store, and
//! the serving side.
//!
//! Field names on the persisted types ([`ZoneDescriptor`],
//! [`MetricsSnapshot`], [`ZoneArtifact`]) are the on-disk JSON contract.
//! Every field is required: a document missing one fails to deserialize
//! at the store boundary instead of surfacing later as a bad lookup.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use film_hotspots_geo::{Coordinate, km_to_radians};
use serde::{Deserialize, Serialize};

/// Cluster label assigned to points that belong to no zone.
pub const NOISE_LABEL: i32 = -1;

/// One recorded filming event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilmingEvent {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Shooting year, when the source provides one.
    #[serde(default)]
    pub year: Option<i32>,
}

impl FilmingEvent {
    /// The event's position.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// An ordered collection of events: the raw input to clustering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    events: Vec<FilmingEvent>,
}

impl PointSet {
    /// Wraps an ordered list of events.
    #[must_use]
    pub const fn new(events: Vec<FilmingEvent>) -> Self {
        Self { events }
    }

    /// Builds a point set from bare coordinates (no ancillary columns).
    #[must_use]
    pub fn from_coordinates(coords: &[Coordinate]) -> Self {
        Self::new(
            coords
                .iter()
                .map(|c| FilmingEvent {
                    lat: c.lat,
                    lon: c.lon,
                    year: None,
                })
                .collect(),
        )
    }

    /// The events, in input order.
    #[must_use]
    pub fn events(&self) -> &[FilmingEvent] {
        &self.events
    }

    /// The event coordinates, in input order.
    #[must_use]
    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.events.iter().map(FilmingEvent::coordinate).collect()
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether there are no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Concatenates two point sets, `self` first.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        let mut events = Vec::with_capacity(self.len() + other.len());
        events.extend_from_slice(&self.events);
        events.extend_from_slice(&other.events);
        Self { events }
    }
}

impl FromIterator<FilmingEvent> for PointSet {
    fn from_iter<T: IntoIterator<Item = FilmingEvent>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Density-based clustering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusteringParams {
    /// Neighborhood radius in kilometers.
    pub eps_km: f64,
    /// Minimum neighborhood size (the point itself included) for a core
    /// point.
    pub min_samples: usize,
}

impl ClusteringParams {
    /// `eps` expressed as a central angle, which is what the clustering
    /// engine compares haversine results against.
    #[must_use]
    pub fn eps_radians(&self) -> f64 {
        km_to_radians(self.eps_km)
    }
}

impl Default for ClusteringParams {
    fn default() -> Self {
        Self {
            eps_km: 0.1,
            min_samples: 10,
        }
    }
}

/// A point set annotated with one cluster label per point.
///
/// Labels are contiguous non-negative cluster ids plus [`NOISE_LABEL`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterAssignment {
    points: Vec<Coordinate>,
    labels: Vec<i32>,
}

impl ClusterAssignment {
    /// Pairs points with labels.
    ///
    /// Returns `None` if the lengths differ, since every point must carry
    /// exactly one label.
    #[must_use]
    pub fn new(points: Vec<Coordinate>, labels: Vec<i32>) -> Option<Self> {
        (points.len() == labels.len()).then_some(Self { points, labels })
    }

    /// The labelled points, in input order.
    #[must_use]
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// One label per point, in input order.
    #[must_use]
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Number of labelled points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the assignment has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points labelled as noise.
    #[must_use]
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE_LABEL).count()
    }

    /// Member points of each non-noise cluster, keyed by ascending
    /// cluster id.
    #[must_use]
    pub fn members_by_cluster(&self) -> BTreeMap<i32, Vec<Coordinate>> {
        let mut clusters: BTreeMap<i32, Vec<Coordinate>> = BTreeMap::new();
        for (point, &label) in self.points.iter().zip(&self.labels) {
            if label != NOISE_LABEL {
                clusters.entry(label).or_default().push(*point);
            }
        }
        clusters
    }
}

/// A persisted circular zone: centroid plus enclosing radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDescriptor {
    /// Cluster id the zone was built from.
    #[serde(rename = "cluster")]
    pub cluster_id: i32,
    /// Centroid latitude (mean of member latitudes).
    pub lat: f64,
    /// Centroid longitude (mean of member longitudes).
    pub lon: f64,
    /// Maximum distance from the centroid to any member, in meters.
    pub radius_m: f64,
    /// Number of member points.
    pub n_points: usize,
}

impl ZoneDescriptor {
    /// The zone centroid.
    #[must_use]
    pub const fn center(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// City-stability metrics reduced from one cluster assignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Number of distinct non-noise clusters.
    pub n_zones: usize,
    /// Mean number of points per cluster.
    pub mean_films_per_zone: f64,
    /// Mean enclosing radius across clusters, in meters.
    pub mean_zone_radius_m: f64,
}

impl MetricsSnapshot {
    /// The snapshot for an assignment with no zones.
    pub const EMPTY: Self = Self {
        n_zones: 0,
        mean_films_per_zone: 0.0,
        mean_zone_radius_m: 0.0,
    };

    /// Metric names and plain `f64` values, in a fixed order, for
    /// key/value sinks such as the experiment log.
    #[must_use]
    pub fn as_pairs(&self) -> [(&'static str, f64); 3] {
        #[allow(clippy::cast_precision_loss)]
        let n_zones = self.n_zones as f64;
        [
            ("n_zones", n_zones),
            ("mean_films_per_zone", self.mean_films_per_zone),
            ("mean_zone_radius_m", self.mean_zone_radius_m),
        ]
    }
}

/// The persisted zone document produced by a deploy.
///
/// Immutable once written; the next deploy writes a new document rather
/// than editing this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneArtifact {
    /// Identifier of the run that produced the zones.
    pub run_id: String,
    /// When the document was written.
    pub created_at_utc: DateTime<Utc>,
    /// Clustering parameters used to build the zones.
    #[serde(flatten)]
    pub params: ClusteringParams,
    /// Metrics of the clustering the zones came from.
    pub metrics: MetricsSnapshot,
    /// One descriptor per zone, ascending by cluster id.
    pub zones: Vec<ZoneDescriptor>,
}

/// The zone nearest to a query point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearestZone {
    /// Cluster id of the nearest zone.
    pub cluster_id: i32,
    /// Distance from the query to the zone centroid, in meters.
    pub distance_m: f64,
    /// Whether the query lies within the zone radius (boundary inclusive).
    pub is_hotspot: bool,
    /// The zone's enclosing radius, in meters.
    pub radius_m: f64,
}

/// Outcome of a nearest-zone lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HotspotLookup {
    /// No zones are deployed.
    NoZonesAvailable,
    /// The nearest zone and its containment result.
    Nearest(NearestZone),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_rejects_length_mismatch() {
        assert!(ClusterAssignment::new(vec![Coordinate::new(0.0, 0.0)], vec![]).is_none());
        assert!(ClusterAssignment::new(vec![], vec![]).is_some());
    }

    #[test]
    fn members_by_cluster_skips_noise_and_sorts() {
        let a = Coordinate::new(1.0, 1.0);
        let b = Coordinate::new(2.0, 2.0);
        let assignment = ClusterAssignment::new(vec![a, b, a, b], vec![1, NOISE_LABEL, 0, 1])
            .expect("equal lengths");

        let members = assignment.members_by_cluster();
        let ids: Vec<i32> = members.keys().copied().collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(members[&1], vec![a, b]);
        assert_eq!(assignment.noise_count(), 1);
    }

    #[test]
    fn concat_keeps_order() {
        let first = PointSet::from_coordinates(&[Coordinate::new(1.0, 1.0)]);
        let second = PointSet::from_coordinates(&[Coordinate::new(2.0, 2.0)]);
        let both = first.concat(&second);
        assert_eq!(both.len(), 2);
        assert!((both.events()[1].lat - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_params_are_hundred_meters_ten_samples() {
        let params = ClusteringParams::default();
        assert_eq!(params.min_samples, 10);
        assert!((params.eps_radians() - 0.1 / 6371.0).abs() < 1e-15);
    }

    #[test]
    fn zone_artifact_json_layout() {
        let artifact = ZoneArtifact {
            run_id: "abc".to_string(),
            created_at_utc: DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            params: ClusteringParams::default(),
            metrics: MetricsSnapshot::EMPTY,
            zones: vec![ZoneDescriptor {
                cluster_id: 0,
                lat: 48.85,
                lon: 2.35,
                radius_m: 80.0,
                n_points: 12,
            }],
        };

        let value = serde_json::to_value(&artifact).unwrap();
        assert_eq!(value["eps_km"], 0.1);
        assert_eq!(value["min_samples"], 10);
        assert_eq!(value["zones"][0]["cluster"], 0);
        assert_eq!(value["metrics"]["n_zones"], 0);
    }

    #[test]
    fn zone_missing_radius_is_rejected() {
        let json = r#"{"cluster": 3, "lat": 48.8, "lon": 2.3, "n_points": 11}"#;
        assert!(serde_json::from_str::<ZoneDescriptor>(json).is_err());
    }

    #[test]
    fn metrics_pairs_are_plain_floats() {
        let pairs = MetricsSnapshot {
            n_zones: 4,
            mean_films_per_zone: 12.5,
            mean_zone_radius_m: 90.0,
        }
        .as_pairs();
        assert_eq!(pairs[0], ("n_zones", 4.0));
        assert_eq!(pairs[1].0, "mean_films_per_zone");
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Great-circle distance helpers.
//!
//! All distances use the haversine formula on a sphere with a fixed radius
//! of [`EARTH_RADIUS_M`]. Coordinates are in degrees; distances come back
//! in meters (or radians for [`central_angle`], which is what the
//! clustering engine compares against its `eps`).

use serde::{Deserialize, Serialize};

/// Earth radius used by every distance computation, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Earth radius in kilometers, used to express `eps` as an angle.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// A `(latitude, longitude)` pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both components are finite and within the WGS84 ranges
    /// (`[-90, 90]` latitude, `[-180, 180]` longitude).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Central angle between two coordinates, in radians.
///
/// The haversine term is clamped to `[0, 1]` before `asin` so that
/// floating-point overshoot on (near-)antipodal inputs cannot produce
/// `NaN`.
#[must_use]
pub fn central_angle(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = b.lon.to_radians() - a.lon.to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Great-circle distance between two coordinates, in meters.
#[must_use]
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    EARTH_RADIUS_M * central_angle(a, b)
}

/// Distances in meters from every point to a single reference point.
///
/// Output order matches `points`.
#[must_use]
pub fn distances_to(points: &[Coordinate], reference: Coordinate) -> Vec<f64> {
    points
        .iter()
        .map(|point| haversine_m(*point, reference))
        .collect()
}

/// Pairwise distances between two equal-length coordinate slices.
///
/// Returns `None` if the slices differ in length.
#[must_use]
pub fn pairwise_m(a: &[Coordinate], b: &[Coordinate]) -> Option<Vec<f64>> {
    if a.len() != b.len() {
        return None;
    }
    Some(a.iter().zip(b).map(|(x, y)| haversine_m(*x, *y)).collect())
}

/// Converts a distance in kilometers to a central angle in radians.
#[must_use]
pub fn km_to_radians(km: f64) -> f64 {
    km / EARTH_RADIUS_KM
}

/// Arithmetic mean of latitudes and longitudes (degree space).
///
/// Plain averaging, not a spherical centroid. Adequate for clusters a few
/// hundred meters wide. Returns `None` for an empty slice.
#[must_use]
pub fn mean_center(points: &[Coordinate]) -> Option<Coordinate> {
    if points.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let (lat_sum, lon_sum) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.lat, lon + p.lon));
    Some(Coordinate::new(lat_sum / n, lon_sum / n))
}

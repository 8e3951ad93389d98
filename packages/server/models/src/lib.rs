#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the film hotspot server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the persisted zone document so the API contract can evolve
//! independently.

use chrono::{DateTime, Utc};
use film_hotspots_zones_models::{HotspotLookup, MetricsSnapshot, ZoneDescriptor};
use serde::{Deserialize, Serialize};

/// Reason reported when a prediction is requested with no deployed zones.
pub const NO_ZONES_AVAILABLE: &str = "no_zones_available";

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Zone-set metrics as returned by the API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMetrics {
    /// Number of zones.
    pub n_zones: usize,
    /// Mean member count per zone.
    pub mean_films_per_zone: f64,
    /// Mean zone radius in meters.
    pub mean_zone_radius_m: f64,
}

impl From<MetricsSnapshot> for ApiMetrics {
    fn from(m: MetricsSnapshot) -> Self {
        Self {
            n_zones: m.n_zones,
            mean_films_per_zone: m.mean_films_per_zone,
            mean_zone_radius_m: m.mean_zone_radius_m,
        }
    }
}

/// One deployed zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiZone {
    /// Cluster id.
    pub cluster: i32,
    /// Centroid latitude.
    pub lat: f64,
    /// Centroid longitude.
    pub lon: f64,
    /// Enclosing radius in meters.
    pub radius_m: f64,
    /// Member count.
    pub n_points: usize,
}

impl From<&ZoneDescriptor> for ApiZone {
    fn from(z: &ZoneDescriptor) -> Self {
        Self {
            cluster: z.cluster_id,
            lat: z.lat,
            lon: z.lon,
            radius_m: z.radius_m,
            n_points: z.n_points,
        }
    }
}

/// `GET /api/zones` response: the deployed zone set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiZones {
    /// Run that produced the zones.
    pub run_id: String,
    /// When the zone document was written.
    pub created_at_utc: DateTime<Utc>,
    /// Metrics of the deployed clustering.
    pub metrics: ApiMetrics,
    /// Store key the zones were loaded from.
    pub zones_key: String,
    /// The zones, ascending by cluster id.
    pub zones: Vec<ApiZone>,
}

/// `POST /api/predict` request body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocationParams {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// `POST /api/predict` response.
///
/// With no deployed zones, `nearestCluster` and `distanceM` are `null` and
/// `reason` is [`NO_ZONES_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPrediction {
    /// Whether the location lies inside its nearest zone.
    pub is_hotspot: bool,
    /// Nearest zone's cluster id.
    pub nearest_cluster: Option<i32>,
    /// Distance to the nearest zone's centroid, in meters.
    pub distance_m: Option<f64>,
    /// Nearest zone's radius, in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_radius_m: Option<f64>,
    /// Run that produced the zones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Why no zone was matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ApiPrediction {
    /// Builds the response for a lookup against the zones of `run_id`.
    #[must_use]
    pub fn from_lookup(lookup: HotspotLookup, run_id: &str) -> Self {
        match lookup {
            HotspotLookup::NoZonesAvailable => Self {
                is_hotspot: false,
                nearest_cluster: None,
                distance_m: None,
                zone_radius_m: None,
                run_id: None,
                reason: Some(NO_ZONES_AVAILABLE.to_string()),
            },
            HotspotLookup::Nearest(nearest) => Self {
                is_hotspot: nearest.is_hotspot,
                nearest_cluster: Some(nearest.cluster_id),
                distance_m: Some(nearest.distance_m),
                zone_radius_m: Some(nearest.radius_m),
                run_id: Some(run_id.to_string()),
                reason: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use film_hotspots_zones_models::NearestZone;

    use super::*;

    #[test]
    fn no_zones_serializes_nulls_and_reason() {
        let json =
            serde_json::to_value(ApiPrediction::from_lookup(HotspotLookup::NoZonesAvailable, "r"))
                .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "isHotspot": false,
                "nearestCluster": null,
                "distanceM": null,
                "reason": "no_zones_available",
            })
        );
    }

    #[test]
    fn nearest_zone_serializes_camel_case() {
        let lookup = HotspotLookup::Nearest(NearestZone {
            cluster_id: 3,
            distance_m: 42.5,
            is_hotspot: true,
            radius_m: 60.0,
        });
        let json = serde_json::to_value(ApiPrediction::from_lookup(lookup, "run1")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "isHotspot": true,
                "nearestCluster": 3,
                "distanceM": 42.5,
                "zoneRadiusM": 60.0,
                "runId": "run1",
            })
        );
    }

    #[test]
    fn zone_field_names() {
        let zone = ApiZone::from(&ZoneDescriptor {
            cluster_id: 0,
            lat: 48.85,
            lon: 2.35,
            radius_m: 75.0,
            n_points: 14,
        });
        let json = serde_json::to_value(zone).unwrap();
        assert_eq!(json["radiusM"], 75.0);
        assert_eq!(json["nPoints"], 14);
        assert_eq!(json["cluster"], 0);
    }
}

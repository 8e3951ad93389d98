//! DBSCAN over great-circle distance.
//!
//! Neighborhoods are computed exhaustively (point counts are a few
//! thousand per window) and compared as central angles against
//! [`ClusteringParams::eps_radians`]. A point is a core point when its
//! neighborhood, itself included, holds at least `min_samples` points.
//!
//! Clusters are grown in input order from the first unlabelled core point,
//! so labels come out contiguous from `0` and identical for identical
//! input. Border points reachable from several clusters keep the first
//! label they receive.

use film_hotspots_geo::{Coordinate, central_angle};
use film_hotspots_zones_models::{ClusterAssignment, ClusteringParams, NOISE_LABEL, PointSet};
use serde::{Deserialize, Serialize};

/// A core point retained by a fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreSample {
    /// Core point position.
    pub coordinate: Coordinate,
    /// Cluster the core point belongs to.
    pub label: i32,
}

/// The fitted clustering model: parameters plus labelled core samples.
///
/// This is the object persisted next to each zone document. It can label
/// new points without re-running the clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneModel {
    /// Parameters the model was fitted with.
    pub params: ClusteringParams,
    /// Core samples in input order.
    pub core_samples: Vec<CoreSample>,
}

impl ZoneModel {
    /// Number of clusters the model knows about.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.core_samples
            .iter()
            .map(|s| s.label)
            .max()
            .map_or(0, |max| usize::try_from(max + 1).unwrap_or(0))
    }

    /// Labels a new point with the cluster of its nearest core sample
    /// within `eps`, or [`NOISE_LABEL`] if no core sample is that close.
    #[must_use]
    pub fn assign(&self, point: Coordinate) -> i32 {
        let eps = self.params.eps_radians();
        let mut best: Option<(f64, i32)> = None;

        for sample in &self.core_samples {
            let d = central_angle(point, sample.coordinate);
            if d <= eps && best.is_none_or(|(best_d, _)| d < best_d) {
                best = Some((d, sample.label));
            }
        }

        best.map_or(NOISE_LABEL, |(_, label)| label)
    }
}

/// Labels plus the fitted model.
#[derive(Debug, Clone)]
pub struct Clustering {
    /// Per-point labels.
    pub assignment: ClusterAssignment,
    /// Model retaining the core samples.
    pub model: ZoneModel,
}

/// Clusters a point set.
///
/// An empty point set yields an empty assignment and a model with no core
/// samples.
#[must_use]
pub fn fit(points: &PointSet, params: &ClusteringParams) -> Clustering {
    let coords = points.coordinates();
    let (labels, is_core) = label_points(&coords, params);

    let core_samples = coords
        .iter()
        .zip(&labels)
        .zip(&is_core)
        .filter(|(_, core)| **core)
        .map(|((coordinate, label), _)| CoreSample {
            coordinate: *coordinate,
            label: *label,
        })
        .collect();

    let assignment = ClusterAssignment::new(coords, labels).unwrap_or_default();

    log::debug!(
        "Clustered {} points: {} noise",
        assignment.len(),
        assignment.noise_count()
    );

    Clustering {
        assignment,
        model: ZoneModel {
            params: *params,
            core_samples,
        },
    }
}

/// Clusters a point set and returns only the labels.
#[must_use]
pub fn fit_predict(points: &PointSet, params: &ClusteringParams) -> ClusterAssignment {
    fit(points, params).assignment
}

fn label_points(coords: &[Coordinate], params: &ClusteringParams) -> (Vec<i32>, Vec<bool>) {
    let neighborhoods = neighborhoods(coords, params.eps_radians());
    let is_core: Vec<bool> = neighborhoods
        .iter()
        .map(|n| n.len() >= params.min_samples)
        .collect();

    let mut labels = vec![NOISE_LABEL; coords.len()];
    let mut next_label = 0;
    let mut stack = Vec::new();

    for start in 0..coords.len() {
        if labels[start] != NOISE_LABEL || !is_core[start] {
            continue;
        }

        stack.push(start);
        while let Some(i) = stack.pop() {
            if labels[i] != NOISE_LABEL {
                continue;
            }
            labels[i] = next_label;
            if is_core[i] {
                stack.extend(
                    neighborhoods[i]
                        .iter()
                        .copied()
                        .filter(|&j| labels[j] == NOISE_LABEL),
                );
            }
        }

        next_label += 1;
    }

    (labels, is_core)
}

/// Indices of all points within `eps` radians of each point, the point
/// itself included.
fn neighborhoods(coords: &[Coordinate], eps: f64) -> Vec<Vec<usize>> {
    let mut neighborhoods: Vec<Vec<usize>> = (0..coords.len()).map(|i| vec![i]).collect();

    for i in 0..coords.len() {
        for j in (i + 1)..coords.len() {
            if central_angle(coords[i], coords[j]) <= eps {
                neighborhoods[i].push(j);
                neighborhoods[j].push(i);
            }
        }
    }

    neighborhoods
}

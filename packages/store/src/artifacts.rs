//! Zone documents and model objects on top of an [`ArtifactStore`].

use film_hotspots_zones_models::ZoneArtifact;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{ArtifactStore, StoreError};

/// Where artifacts live inside the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    /// Prefix for serialized clustering models.
    pub model_prefix: String,
    /// Prefix for zone documents.
    pub zones_prefix: String,
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self {
            model_prefix: "models/".to_string(),
            zones_prefix: "models/zones/".to_string(),
        }
    }
}

impl ArtifactLayout {
    /// Reads `MODEL_PREFIX` / `ZONES_PREFIX`, falling back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model_prefix: std::env::var("MODEL_PREFIX").unwrap_or(defaults.model_prefix),
            zones_prefix: std::env::var("ZONES_PREFIX").unwrap_or(defaults.zones_prefix),
        }
    }

    /// Key of the zone document for a run.
    #[must_use]
    pub fn zones_key(&self, run_id: &str) -> String {
        format!("{}zones_{run_id}.json", self.zones_prefix)
    }

    /// Key of the model object for a run.
    #[must_use]
    pub fn model_key(&self, run_id: &str) -> String {
        format!("{}model_{run_id}.msgpack", self.model_prefix)
    }
}

/// A zone document together with the key it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedZones {
    /// Store key of the document.
    pub key: String,
    /// The parsed document.
    pub artifact: ZoneArtifact,
}

/// Writes a zone document and returns its key.
///
/// # Errors
///
/// Returns [`StoreError`] if serialization or the write fails.
pub async fn save_zones(
    store: &dyn ArtifactStore,
    layout: &ArtifactLayout,
    artifact: &ZoneArtifact,
) -> Result<String, StoreError> {
    let key = layout.zones_key(&artifact.run_id);
    let body = serde_json::to_vec_pretty(artifact)?;
    store.put(&key, body, "application/json").await?;
    log::info!(
        "Saved {} zones to {}",
        artifact.zones.len(),
        store.location(&key)
    );
    Ok(key)
}

/// Writes a model object as `MessagePack` and returns its key.
///
/// # Errors
///
/// Returns [`StoreError`] if encoding or the write fails.
pub async fn save_model<M: Serialize + Sync>(
    store: &dyn ArtifactStore,
    layout: &ArtifactLayout,
    run_id: &str,
    model: &M,
) -> Result<String, StoreError> {
    let key = layout.model_key(run_id);
    let body = rmp_serde::to_vec_named(model)?;
    store.put(&key, body, "application/msgpack").await?;
    Ok(key)
}

/// Reads a model object previously written by [`save_model`].
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] if the key is missing, or
/// [`StoreError::InvalidDocument`] if it does not decode.
pub async fn load_model<M: DeserializeOwned>(
    store: &dyn ArtifactStore,
    key: &str,
) -> Result<M, StoreError> {
    let data = store.get(key).await?;
    rmp_serde::from_slice(&data).map_err(|e| StoreError::InvalidDocument {
        key: key.to_string(),
        message: e.to_string(),
    })
}

/// Loads the most recently written zone document.
///
/// Only `.json` keys under the zones prefix are considered. Ties on
/// modification time go to the lexicographically greatest key.
///
/// # Errors
///
/// Returns [`StoreError::NoArtifacts`] if no document exists, or
/// [`StoreError::InvalidDocument`] if the latest one is missing a field or
/// otherwise fails to parse.
pub async fn load_latest_zones(
    store: &dyn ArtifactStore,
    layout: &ArtifactLayout,
) -> Result<LoadedZones, StoreError> {
    let latest = store
        .list(&layout.zones_prefix)
        .await?
        .into_iter()
        .filter(|o| o.key.ends_with(".json"))
        .max_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.key.cmp(&b.key))
        })
        .ok_or_else(|| StoreError::NoArtifacts {
            prefix: store.location(&layout.zones_prefix),
        })?;

    let data = store.get(&latest.key).await?;
    let artifact: ZoneArtifact =
        serde_json::from_slice(&data).map_err(|e| StoreError::InvalidDocument {
            key: latest.key.clone(),
            message: e.to_string(),
        })?;

    log::info!(
        "Loaded {} zones from run {} ({})",
        artifact.zones.len(),
        artifact.run_id,
        latest.key
    );

    Ok(LoadedZones {
        key: latest.key,
        artifact,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use film_hotspots_zones_models::{ClusteringParams, MetricsSnapshot, ZoneDescriptor};

    use super::*;
    use crate::local::LocalStore;

    fn artifact(run_id: &str, n_zones: usize) -> ZoneArtifact {
        let zones: Vec<ZoneDescriptor> = (0..n_zones)
            .map(|i| ZoneDescriptor {
                cluster_id: i32::try_from(i).unwrap(),
                lat: 48.85,
                lon: 2.35,
                radius_m: 50.0,
                n_points: 12,
            })
            .collect();
        ZoneArtifact {
            run_id: run_id.to_string(),
            created_at_utc: Utc::now(),
            params: ClusteringParams::default(),
            metrics: MetricsSnapshot {
                n_zones,
                mean_films_per_zone: 12.0,
                mean_zone_radius_m: 50.0,
            },
            zones,
        }
    }

    fn temp_store(name: &str) -> (LocalStore, std::path::PathBuf) {
        let root = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&root);
        (LocalStore::new(&root), root)
    }

    #[test]
    fn keys_follow_layout() {
        let layout = ArtifactLayout::default();
        assert_eq!(layout.zones_key("r1"), "models/zones/zones_r1.json");
        assert_eq!(layout.model_key("r1"), "models/model_r1.msgpack");
    }

    #[tokio::test]
    async fn latest_zones_wins() {
        let (store, root) = temp_store("film_hotspots_artifacts_latest");
        let layout = ArtifactLayout::default();

        save_zones(&store, &layout, &artifact("run_a", 1)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        save_zones(&store, &layout, &artifact("run_b", 3)).await.unwrap();
        save_model(&store, &layout, "run_b", &vec![1_u8, 2, 3])
            .await
            .unwrap();

        let loaded = load_latest_zones(&store, &layout).await.unwrap();
        assert_eq!(loaded.key, "models/zones/zones_run_b.json");
        assert_eq!(loaded.artifact.run_id, "run_b");
        assert_eq!(loaded.artifact.zones.len(), 3);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn no_documents_is_an_error() {
        let (store, root) = temp_store("film_hotspots_artifacts_none");
        let result = load_latest_zones(&store, &ArtifactLayout::default()).await;
        assert!(matches!(result, Err(StoreError::NoArtifacts { .. })));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn document_missing_field_is_rejected() {
        let (store, root) = temp_store("film_hotspots_artifacts_invalid");
        let layout = ArtifactLayout::default();

        let body = br#"{"run_id": "x", "created_at_utc": "2024-01-01T00:00:00Z",
            "eps_km": 0.1, "min_samples": 10,
            "metrics": {"n_zones": 1, "mean_films_per_zone": 10.0, "mean_zone_radius_m": 5.0},
            "zones": [{"cluster": 0, "lat": 48.8, "lon": 2.3, "n_points": 10}]}"#;
        store
            .put(&layout.zones_key("x"), body.to_vec(), "application/json")
            .await
            .unwrap();

        let result = load_latest_zones(&store, &layout).await;
        assert!(matches!(result, Err(StoreError::InvalidDocument { .. })));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn model_roundtrip() {
        let (store, root) = temp_store("film_hotspots_artifacts_model");
        let layout = ArtifactLayout::default();

        let params = ClusteringParams::default();
        let key = save_model(&store, &layout, "m1", &params).await.unwrap();
        let decoded: ClusteringParams = load_model(&store, &key).await.unwrap();
        assert_eq!(decoded, params);

        let _ = std::fs::remove_dir_all(&root);
    }
}

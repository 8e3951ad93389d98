//! The in-memory zone set.

use std::sync::Arc;

use film_hotspots_store::{ArtifactLayout, ArtifactStore, LoadedZones, StoreError, load_latest_zones};
use tokio::sync::RwLock;

/// Holds the most recently deployed zone set.
///
/// Loaded lazily on first use. A failed load leaves the cache empty so the
/// next request tries again. [`ZoneCache::refresh`] swaps in a whole new
/// set, so readers never see a partially replaced one.
pub struct ZoneCache {
    store: Arc<dyn ArtifactStore>,
    layout: ArtifactLayout,
    current: RwLock<Option<Arc<LoadedZones>>>,
}

impl ZoneCache {
    /// Creates an empty cache over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ArtifactStore>, layout: ArtifactLayout) -> Self {
        Self {
            store,
            layout,
            current: RwLock::new(None),
        }
    }

    /// The cached zone set, loading it if nothing is cached yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the zone set has to be loaded and the load
    /// fails.
    pub async fn get(&self) -> Result<Arc<LoadedZones>, StoreError> {
        if let Some(zones) = self.current.read().await.as_ref() {
            return Ok(Arc::clone(zones));
        }

        let mut current = self.current.write().await;
        if let Some(zones) = current.as_ref() {
            return Ok(Arc::clone(zones));
        }

        let loaded = Arc::new(load_latest_zones(self.store.as_ref(), &self.layout).await?);
        *current = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Reloads the latest zone set and replaces the cached one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the load fails; the previous set stays
    /// cached.
    pub async fn refresh(&self) -> Result<Arc<LoadedZones>, StoreError> {
        let loaded = Arc::new(load_latest_zones(self.store.as_ref(), &self.layout).await?);
        log::info!("Refreshed zones: run {}", loaded.artifact.run_id);
        *self.current.write().await = Some(Arc::clone(&loaded));
        Ok(loaded)
    }
}

//! The baseline window: a CSV snapshot kept in the artifact store.

use film_hotspots_store::{ArtifactStore, StoreError};
use film_hotspots_zones_models::PointSet;

use crate::EventsError;
use crate::csv_points::points_from_csv;

/// Loads the baseline snapshot at `key`.
///
/// Returns `Ok(None)` when the object does not exist, so the retrain gate
/// can treat the baseline as unavailable. Transport failures are errors.
///
/// # Errors
///
/// Returns [`EventsError::Store`] on store failures other than a missing
/// key, or a CSV error if the snapshot is malformed.
pub async fn load_baseline(
    store: &dyn ArtifactStore,
    key: &str,
) -> Result<Option<PointSet>, EventsError> {
    log::info!("Loading baseline from {}", store.location(key));

    let data = match store.get(key).await {
        Ok(data) => data,
        Err(StoreError::NotFound { .. }) => {
            log::warn!("Baseline {key} not found");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let points = points_from_csv(data.as_slice())?;
    log::info!("Loaded {} baseline events", points.len());
    Ok(Some(points))
}

//! HTTP handler functions for the film hotspot API.

use actix_web::{HttpResponse, web};
use film_hotspots_geo::Coordinate;
use film_hotspots_server_models::{ApiHealth, ApiPrediction, ApiZone, ApiZones, LocationParams};
use film_hotspots_store::StoreError;
use film_hotspots_zones::nearest_zone;

use crate::AppState;

fn zones_unavailable(e: &StoreError) -> HttpResponse {
    log::error!("Zone set unavailable: {e}");
    HttpResponse::ServiceUnavailable().json(serde_json::json!({
        "error": format!("Zone set unavailable: {e}")
    }))
}

/// `GET /`
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(
        "<h1>Cinematic Paris Hotspot API</h1>\
         <p>Endpoints: <code>GET /api/health</code>, <code>GET /api/zones</code>, \
         <code>POST /api/zones/refresh</code>, <code>POST /api/predict</code></p>",
    )
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/zones`
///
/// Returns the deployed zone set with its run metadata.
pub async fn zones(state: web::Data<AppState>) -> HttpResponse {
    match state.zones.get().await {
        Ok(loaded) => {
            let artifact = &loaded.artifact;
            HttpResponse::Ok().json(ApiZones {
                run_id: artifact.run_id.clone(),
                created_at_utc: artifact.created_at_utc,
                metrics: artifact.metrics.into(),
                zones_key: loaded.key.clone(),
                zones: artifact.zones.iter().map(ApiZone::from).collect(),
            })
        }
        Err(e) => zones_unavailable(&e),
    }
}

/// `POST /api/zones/refresh`
///
/// Reloads the latest zone set from the store.
pub async fn refresh_zones(state: web::Data<AppState>) -> HttpResponse {
    match state.zones.refresh().await {
        Ok(loaded) => HttpResponse::Ok().json(serde_json::json!({
            "runId": loaded.artifact.run_id,
            "zonesKey": loaded.key,
            "nZones": loaded.artifact.zones.len(),
        })),
        Err(e) => zones_unavailable(&e),
    }
}

/// `POST /api/predict`
///
/// Reports whether a location lies inside its nearest deployed zone.
pub async fn predict(
    state: web::Data<AppState>,
    body: web::Json<LocationParams>,
) -> HttpResponse {
    let query = Coordinate::new(body.lat, body.lon);
    if !query.is_valid() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("Coordinates out of range: lat {}, lon {}", body.lat, body.lon)
        }));
    }

    match state.zones.get().await {
        Ok(loaded) => {
            let lookup = nearest_zone(query, &loaded.artifact.zones);
            HttpResponse::Ok().json(ApiPrediction::from_lookup(
                lookup,
                &loaded.artifact.run_id,
            ))
        }
        Err(e) => zones_unavailable(&e),
    }
}

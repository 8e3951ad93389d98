#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for film hotspot queries.
//!
//! Answers "is this location a filming hotspot?" against the most recently
//! deployed zone set, which is read from the artifact store on first use
//! and held in a [`cache::ZoneCache`].
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |---|---|---|
//! | `BIND_ADDR` | No | Listen address (default `127.0.0.1`) |
//! | `PORT` | No | Listen port (default `8080`) |
//!
//! Store selection follows `film_hotspots_store` (`HOTSPOT_STORE`,
//! `S3_BUCKET`, `ZONES_PREFIX`, ...).

pub mod cache;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use film_hotspots_store::{ArtifactLayout, ArtifactStore, StoreError, open_from_env};

use crate::cache::ZoneCache;

/// Errors that can stop the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The artifact store could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Binding or serving failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState {
    /// The deployed zone set.
    pub zones: ZoneCache,
}

impl AppState {
    /// Creates state over `store` with an empty zone cache.
    #[must_use]
    pub fn new(store: Arc<dyn ArtifactStore>, layout: ArtifactLayout) -> Self {
        Self {
            zones: ZoneCache::new(store, layout),
        }
    }
}

/// Registers the API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index)).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/zones", web::get().to(handlers::zones))
            .route("/zones/refresh", web::post().to(handlers::refresh_zones))
            .route("/predict", web::post().to(handlers::predict)),
    );
}

/// Starts the hotspot API server.
///
/// Opens the artifact store from the environment and serves until
/// shutdown. Zones are not loaded until the first request needs them. The
/// caller provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the store cannot be opened or the HTTP
/// server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), ServerError> {
    let store = open_from_env().await?;
    let state = web::Data::new(AppState::new(store, ArtifactLayout::from_env()));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}

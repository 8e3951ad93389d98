#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Artifact storage for deployed zone sets and clustering models.
//!
//! The retrain job writes a zone document and a model object per deploy;
//! the server reads back the most recently written zone document. Both go
//! through the [`ArtifactStore`] trait, backed either by an S3-compatible
//! bucket ([`s3::S3Store`]) or a local directory ([`local::LocalStore`]).
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |---|---|---|
//! | `HOTSPOT_STORE` | No | `s3` (default) or `local` |
//! | `S3_BUCKET` | No | Bucket name (default `jedha-lead-bucket`) |
//! | `HOTSPOT_STORE_DIR` | For `local` | Root directory of the local store |
//! | `MODEL_PREFIX` | No | Key prefix for models (default `models/`) |
//! | `ZONES_PREFIX` | No | Key prefix for zone documents (default `models/zones/`) |
//!
//! The S3 backend uses the standard AWS SDK configuration chain, so
//! `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_REGION` /
//! `AWS_ENDPOINT_URL` apply as usual.

pub mod artifacts;
pub mod local;
pub mod s3;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use artifacts::{
    ArtifactLayout, LoadedZones, load_latest_zones, load_model, save_model, save_zones,
};

/// Errors that can occur during artifact store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Missing required environment variable.
    #[error("Missing environment variable: {name}")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: String,
    },

    /// Unrecognised `HOTSPOT_STORE` value.
    #[error("Unknown store backend: {0}")]
    UnknownBackend(String),

    /// The requested object does not exist.
    #[error("Object not found: {key}")]
    NotFound {
        /// Object key.
        key: String,
    },

    /// No artifact exists under a prefix.
    #[error("No artifacts found under {prefix}")]
    NoArtifacts {
        /// Key prefix that was searched.
        prefix: String,
    },

    /// Remote read failed.
    #[error("Failed to download {location}: {source}")]
    Download {
        /// Full object location (e.g. `s3://bucket/key`).
        location: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Remote write failed.
    #[error("Failed to upload {location}: {source}")]
    Upload {
        /// Full object location.
        location: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Remote listing failed.
    #[error("Failed to list {location}: {source}")]
    List {
        /// Full prefix location.
        location: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A stored document could not be decoded.
    #[error("Invalid document at {key}: {message}")]
    InvalidDocument {
        /// Object key.
        key: String,
        /// Decoder error message.
        message: String,
    },

    /// Serialising a JSON document failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Serialising a model object failed.
    #[error("Model encoding error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// I/O error reading or writing local files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata for one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Full object key.
    pub key: String,
    /// When the object was last written.
    pub last_modified: DateTime<Utc>,
}

/// A key/value object store.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Reads an object.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the key does not exist, or a
    /// backend error on transport failure.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Writes an object, replacing any previous content at `key`.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StoreError>;

    /// Lists every object whose key starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the listing fails.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StoreError>;

    /// Human-readable location of `key`, for logs and run records.
    fn location(&self, key: &str) -> String;
}

/// Which backend to open, with its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// S3-compatible bucket.
    S3 {
        /// Bucket name.
        bucket: String,
    },
    /// Local directory.
    Local {
        /// Root directory.
        root: PathBuf,
    },
}

/// Default bucket when `S3_BUCKET` is unset.
pub const DEFAULT_BUCKET: &str = "jedha-lead-bucket";

impl StoreConfig {
    /// Reads the backend selection from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownBackend`] for an unrecognised
    /// `HOTSPOT_STORE`, or [`StoreError::MissingEnv`] if the local backend
    /// is selected without `HOTSPOT_STORE_DIR`.
    pub fn from_env() -> Result<Self, StoreError> {
        let backend = std::env::var("HOTSPOT_STORE").unwrap_or_else(|_| "s3".to_string());

        match backend.as_str() {
            "s3" => Ok(Self::S3 {
                bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string()),
            }),
            "local" => Ok(Self::Local {
                root: PathBuf::from(require_env("HOTSPOT_STORE_DIR")?),
            }),
            other => Err(StoreError::UnknownBackend(other.to_string())),
        }
    }

    /// Opens the configured backend.
    pub async fn open(&self) -> Arc<dyn ArtifactStore> {
        match self {
            Self::S3 { bucket } => Arc::new(s3::S3Store::from_env(bucket).await),
            Self::Local { root } => Arc::new(local::LocalStore::new(root)),
        }
    }
}

/// Opens the store selected by the environment.
///
/// # Errors
///
/// See [`StoreConfig::from_env`].
pub async fn open_from_env() -> Result<Arc<dyn ArtifactStore>, StoreError> {
    let config = StoreConfig::from_env()?;
    log::info!("Opening artifact store: {config:?}");
    Ok(config.open().await)
}

fn require_env(name: &str) -> Result<String, StoreError> {
    std::env::var(name).map_err(|_| StoreError::MissingEnv {
        name: name.to_string(),
    })
}

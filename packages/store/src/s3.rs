//! S3-compatible backend.
//!
//! Reads are retried up to [`MAX_DOWNLOAD_ATTEMPTS`] times with
//! exponential backoff; a missing key is reported immediately as
//! [`StoreError::NotFound`] without retrying.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};

use crate::{ArtifactStore, ObjectInfo, StoreError};

/// Maximum number of download attempts (initial + retries).
const MAX_DOWNLOAD_ATTEMPTS: u32 = 3;

/// Base delay between download retries (doubles each attempt).
const RETRY_BASE_DELAY: std::time::Duration = std::time::Duration::from_secs(2);

/// Artifact store backed by one S3 bucket.
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    /// Creates a client from the standard AWS environment/profile chain.
    ///
    /// Set `S3_FORCE_PATH_STYLE=1` for S3-compatible services (`MinIO`,
    /// R2) that need path-style addressing.
    pub async fn from_env(bucket: &str) -> Self {
        let sdk_config = aws_config::load_from_env().await;
        let force_path_style = std::env::var("S3_FORCE_PATH_STYLE")
            .is_ok_and(|v| matches!(v.as_str(), "1" | "true"));

        let config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(force_path_style)
            .build();

        Self::new(aws_sdk_s3::Client::from_conf(config), bucket)
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn new(client: aws_sdk_s3::Client, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }

    /// Single download attempt.
    async fn get_once(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(aws_sdk_s3::operation::get_object::GetObjectError::is_no_such_key)
                {
                    StoreError::NotFound {
                        key: key.to_string(),
                    }
                } else {
                    StoreError::Download {
                        location: self.location(key),
                        source: Box::new(e),
                    }
                }
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Download {
                location: self.location(key),
                source: Box::new(e),
            })?;

        Ok(bytes.into_bytes().to_vec())
    }
}

#[async_trait]
impl ArtifactStore for S3Store {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        log::info!("Downloading {}", self.location(key));

        let mut last_err: Option<StoreError> = None;

        for attempt in 1..=MAX_DOWNLOAD_ATTEMPTS {
            match self.get_once(key).await {
                Ok(data) => {
                    #[allow(clippy::cast_precision_loss)] // display-only KB value
                    let kb = data.len() as f64 / 1024.0;
                    log::info!("  downloaded {key} ({kb:.1} KB)");
                    return Ok(data);
                }
                Err(e @ StoreError::Download { .. }) if attempt < MAX_DOWNLOAD_ATTEMPTS => {
                    let delay = RETRY_BASE_DELAY * 2u32.saturating_pow(attempt - 1);
                    log::warn!(
                        "  download attempt {attempt}/{MAX_DOWNLOAD_ATTEMPTS} failed, \
                         retrying in {delay:.1?}..."
                    );
                    last_err = Some(e);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| StoreError::Download {
            location: self.location(key),
            source: "all download attempts exhausted".into(),
        }))
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        #[allow(clippy::cast_precision_loss)] // display-only KB value
        let kb = body.len() as f64 / 1024.0;
        log::info!("Uploading {} ({kb:.1} KB)", self.location(key));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StoreError::Upload {
                location: self.location(key),
                source: Box::new(e),
            })?;

        log::info!("  uploaded {key}");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StoreError> {
        log::info!("Listing {}*", self.location(prefix));

        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let output = request.send().await.map_err(|e| StoreError::List {
                location: self.location(prefix),
                source: Box::new(e),
            })?;

            for obj in output.contents() {
                let Some(key) = obj.key() else {
                    continue;
                };
                let last_modified = obj
                    .last_modified()
                    .and_then(|t| {
                        DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())
                    })
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);

                objects.push(ObjectInfo {
                    key: key.to_string(),
                    last_modified,
                });
            }

            if output.is_truncated() == Some(true) {
                continuation_token = output.next_continuation_token().map(String::from);
            } else {
                break;
            }
        }

        log::info!("  found {} objects", objects.len());
        Ok(objects)
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{key}", self.bucket)
    }
}

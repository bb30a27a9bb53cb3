//! Snapshot persistence on top of a minimal object-storage interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use thiserror::Error;

use crate::{CityName, Snapshot, StoreError, WeatherReading, config::DEFAULT_REGION};

pub mod memory;
pub mod s3;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Outcome of a bucket existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketStatus {
    Exists,
    NotFound,
    /// The check itself failed; whether the bucket exists is not known.
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectErrorKind {
    Denied,
    NoSuchBucket,
    /// Creating a bucket that this account already owns.
    AlreadyOwned,
    Other,
}

#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ObjectError {
    pub kind: ObjectErrorKind,
    pub message: String,
}

impl ObjectError {
    pub fn new(kind: ObjectErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// The handful of bucket operations the pipeline needs.
#[async_trait]
pub trait ObjectStore: Send + Sync + Debug {
    async fn head_bucket(&self, bucket: &str) -> BucketStatus;

    /// `location_constraint` is `None` for the default region.
    async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<&str>,
    ) -> Result<(), ObjectError>;

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectError>;
}

/// Where a snapshot ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSnapshot {
    pub key: String,
    pub captured_at: DateTime<Utc>,
}

/// Writes one JSON object per (city, run) into a single bucket.
#[derive(Debug)]
pub struct SnapshotStore {
    backend: Box<dyn ObjectStore>,
    bucket: String,
    region: String,
}

impl SnapshotStore {
    pub fn new(backend: Box<dyn ObjectStore>, bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self { backend, bucket: bucket.into(), region: region.into() }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Location constraint to send when creating the bucket.
    fn location_constraint(&self) -> Option<&str> {
        if self.region == DEFAULT_REGION { None } else { Some(self.region.as_str()) }
    }

    /// Create the bucket if it is missing. A bucket that already exists is
    /// success.
    pub async fn ensure_bucket(&self) -> Result<(), StoreError> {
        match self.backend.head_bucket(&self.bucket).await {
            BucketStatus::Exists => {
                tracing::info!(bucket = %self.bucket, "bucket exists");
                Ok(())
            }
            BucketStatus::Unknown(reason) => {
                tracing::error!(bucket = %self.bucket, %reason, "could not check bucket");
                Err(StoreError::BucketUnavailable { bucket: self.bucket.clone(), reason })
            }
            BucketStatus::NotFound => {
                let constraint = self.location_constraint();
                tracing::info!(
                    bucket = %self.bucket,
                    region = %self.region,
                    constrained = constraint.is_some(),
                    "creating bucket"
                );

                match self.backend.create_bucket(&self.bucket, constraint).await {
                    Ok(()) => {
                        tracing::info!(bucket = %self.bucket, "created bucket");
                        Ok(())
                    }
                    Err(e) if e.kind == ObjectErrorKind::AlreadyOwned => {
                        tracing::info!(bucket = %self.bucket, "bucket appeared while creating it");
                        Ok(())
                    }
                    Err(e) => {
                        tracing::error!(bucket = %self.bucket, error = %e, "failed to create bucket");
                        Err(StoreError::BucketUnavailable {
                            bucket: self.bucket.clone(),
                            reason: e.message,
                        })
                    }
                }
            }
        }
    }

    /// Write `reading` for `city`, stamped with the current time.
    pub async fn save(&self, reading: &WeatherReading, city: &CityName) -> Result<SavedSnapshot, StoreError> {
        self.save_at(reading, city, Utc::now()).await
    }

    /// Write `reading` for `city`, stamped with `captured_at`. A second write
    /// for the same city within the same second replaces the first.
    pub async fn save_at(
        &self,
        reading: &WeatherReading,
        city: &CityName,
        captured_at: DateTime<Utc>,
    ) -> Result<SavedSnapshot, StoreError> {
        let snapshot = Snapshot::new(city.clone(), reading.clone(), captured_at);
        let key = snapshot.storage_key();

        let body = snapshot.to_bytes().map_err(|e| StoreError::WriteFailed {
            key: key.clone(),
            reason: format!("could not serialize snapshot: {e}"),
        })?;

        match self.backend.put_object(&self.bucket, &key, body, CONTENT_TYPE_JSON).await {
            Ok(()) => {
                tracing::info!(%city, bucket = %self.bucket, %key, "saved snapshot");
                Ok(SavedSnapshot { key, captured_at: snapshot.captured_at })
            }
            Err(e) => {
                tracing::error!(%city, bucket = %self.bucket, %key, error = %e, "failed to save snapshot");
                Err(match e.kind {
                    ObjectErrorKind::Denied => StoreError::WriteDenied { key, reason: e.message },
                    ObjectErrorKind::NoSuchBucket => StoreError::BucketUnavailable {
                        bucket: self.bucket.clone(),
                        reason: e.message,
                    },
                    ObjectErrorKind::AlreadyOwned | ObjectErrorKind::Other => {
                        StoreError::WriteFailed { key, reason: e.message }
                    }
                })
            }
        }
    }
}

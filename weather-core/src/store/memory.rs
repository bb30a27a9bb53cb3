use async_trait::async_trait;
use parking_lot::Mutex;
use std::{collections::BTreeMap, sync::Arc};

use super::{BucketStatus, ObjectError, ObjectErrorKind, ObjectStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Default)]
struct Bucket {
    location_constraint: Option<String>,
    objects: BTreeMap<String, StoredObject>,
}

#[derive(Debug, Default)]
struct Inner {
    buckets: BTreeMap<String, Bucket>,
    head_failure: Option<String>,
    deny_writes: bool,
    create_calls: usize,
    put_calls: usize,
}

/// Process-local object store. Clones share the same contents, so a caller
/// can hand one clone to a [`super::SnapshotStore`] and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(bucket: &str) -> Self {
        let store = Self::new();
        store.inner.lock().buckets.insert(bucket.to_string(), Bucket::default());
        store
    }

    /// Make every `head_bucket` report [`BucketStatus::Unknown`].
    pub fn fail_head(&self, reason: &str) {
        self.inner.lock().head_failure = Some(reason.to_string());
    }

    /// Reject every `put_object` as access denied.
    pub fn deny_writes(&self) {
        self.inner.lock().deny_writes = true;
    }

    pub fn create_calls(&self) -> usize {
        self.inner.lock().create_calls
    }

    pub fn put_calls(&self) -> usize {
        self.inner.lock().put_calls
    }

    /// `None` if the bucket does not exist, otherwise its location constraint.
    pub fn bucket_region(&self, bucket: &str) -> Option<Option<String>> {
        self.inner.lock().buckets.get(bucket).map(|b| b.location_constraint.clone())
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.inner.lock().buckets.get(bucket)?.objects.get(key).cloned()
    }

    /// Keys in `bucket`, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.inner
            .lock()
            .buckets
            .get(bucket)
            .map(|b| b.objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn head_bucket(&self, bucket: &str) -> BucketStatus {
        let inner = self.inner.lock();
        if let Some(reason) = &inner.head_failure {
            return BucketStatus::Unknown(reason.clone());
        }
        if inner.buckets.contains_key(bucket) {
            BucketStatus::Exists
        } else {
            BucketStatus::NotFound
        }
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<&str>,
    ) -> Result<(), ObjectError> {
        let mut inner = self.inner.lock();
        inner.create_calls += 1;
        if inner.buckets.contains_key(bucket) {
            return Err(ObjectError::new(
                ObjectErrorKind::AlreadyOwned,
                format!("bucket {bucket} already exists"),
            ));
        }
        inner.buckets.insert(
            bucket.to_string(),
            Bucket {
                location_constraint: location_constraint.map(str::to_owned),
                objects: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectError> {
        let mut inner = self.inner.lock();
        inner.put_calls += 1;
        if inner.deny_writes {
            return Err(ObjectError::new(ObjectErrorKind::Denied, "Access Denied"));
        }
        let Some(target) = inner.buckets.get_mut(bucket) else {
            return Err(ObjectError::new(
                ObjectErrorKind::NoSuchBucket,
                format!("bucket {bucket} does not exist"),
            ));
        };
        target.objects.insert(
            key.to_string(),
            StoredObject { body, content_type: content_type.to_string() },
        );
        Ok(())
    }
}

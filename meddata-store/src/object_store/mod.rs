//! Object-store abstraction.
//!
//! The trait covers exactly the operations the dataset service needs; the
//! S3 implementation talks to MinIO, the in-memory implementation backs
//! tests without a running object store.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::errors::StoreError;

pub mod in_memory;
pub mod s3;

pub use in_memory::InMemoryStore;
pub use s3::S3ObjectStore;

/// One entry of a listing: either an object or, for non-recursive listings,
/// an immediate sub-prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Object key, or prefix string ending in `/` when `is_prefix` is set
    pub key: String,
    /// Object size in bytes (0 for prefixes)
    pub size: u64,
    /// True when this entry is a common prefix rather than an object
    pub is_prefix: bool,
}

/// Metadata of a stored object
#[derive(Debug, Clone)]
pub struct ObjectStat {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    /// User metadata stored with the object
    pub metadata: HashMap<String, String>,
}

/// Storage backend for buckets and objects
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError>;

    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    /// Delete a bucket. The bucket must already be empty.
    async fn delete_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    async fn list_buckets(&self) -> Result<Vec<String>, StoreError>;

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<(), StoreError>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError>;

    /// Metadata of an object, or `None` if no such key exists
    async fn stat_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectStat>, StoreError>;

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StoreError>;

    /// List objects under `prefix`. When `recursive` is false, keys are
    /// grouped at the next `/` and reported as prefix entries, matching the
    /// delimiter semantics of S3 listings.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<ObjectEntry>, StoreError>;
}

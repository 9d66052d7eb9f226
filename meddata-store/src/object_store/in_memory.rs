use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::{ObjectEntry, ObjectStat, ObjectStore};
use crate::errors::StoreError;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    metadata: HashMap<String, String>,
    last_modified: DateTime<Utc>,
}

/// In-memory object store used by tests.
///
/// Keys are held in a `BTreeMap` per bucket so listings come back in the
/// same lexicographic order S3 returns them in.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    buckets: Arc<RwLock<HashMap<String, BTreeMap<String, StoredObject>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_err<T>(e: std::sync::PoisonError<T>) -> StoreError {
        StoreError::Backend(format!("lock poisoned: {}", e))
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        let buckets = self.buckets.read().map_err(Self::lock_err)?;
        Ok(buckets.contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let mut buckets = self.buckets.write().map_err(Self::lock_err)?;
        buckets.entry(bucket.to_string()).or_default();
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let mut buckets = self.buckets.write().map_err(Self::lock_err)?;
        match buckets.get(bucket) {
            Some(objects) if !objects.is_empty() => Err(StoreError::Backend(format!(
                "bucket '{}' is not empty",
                bucket
            ))),
            Some(_) => {
                buckets.remove(bucket);
                Ok(())
            }
            None => Err(StoreError::BucketNotFound(bucket.to_string())),
        }
    }

    async fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        let buckets = self.buckets.read().map_err(Self::lock_err)?;
        let mut names: Vec<String> = buckets.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<(), StoreError> {
        let mut buckets = self.buckets.write().map_err(Self::lock_err)?;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_string()))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                data,
                metadata: metadata.unwrap_or_default(),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        let buckets = self.buckets.read().map_err(Self::lock_err)?;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_string()))?;
        objects
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| StoreError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn stat_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectStat>, StoreError> {
        let buckets = self.buckets.read().map_err(Self::lock_err)?;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_string()))?;
        Ok(objects.get(key).map(|o| ObjectStat {
            key: key.to_string(),
            size: o.data.len() as u64,
            last_modified: Some(o.last_modified),
            metadata: o.metadata.clone(),
        }))
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let mut buckets = self.buckets.write().map_err(Self::lock_err)?;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_string()))?;
        // S3 object removal is idempotent; removing a missing key is not an error
        objects.remove(key);
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<ObjectEntry>, StoreError> {
        let buckets = self.buckets.read().map_err(Self::lock_err)?;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_string()))?;

        let mut entries = Vec::new();
        let mut seen_prefixes: Vec<String> = Vec::new();

        for (key, object) in objects.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            if recursive {
                entries.push(ObjectEntry {
                    key: key.clone(),
                    size: object.data.len() as u64,
                    is_prefix: false,
                });
                continue;
            }
            let rest = &key[prefix.len()..];
            match rest.find('/') {
                Some(pos) => {
                    let common = format!("{}{}", prefix, &rest[..=pos]);
                    if seen_prefixes.last() != Some(&common) {
                        seen_prefixes.push(common.clone());
                        entries.push(ObjectEntry {
                            key: common,
                            size: 0,
                            is_prefix: true,
                        });
                    }
                }
                None => entries.push(ObjectEntry {
                    key: key.clone(),
                    size: object.data.len() as u64,
                    is_prefix: false,
                }),
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_keys(bucket: &str, keys: &[&str]) -> InMemoryStore {
        let store = InMemoryStore::new();
        store.create_bucket(bucket).await.unwrap();
        for key in keys {
            store
                .put_object(bucket, key, Bytes::from_static(b"x"), None)
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_bucket_lifecycle() {
        let store = InMemoryStore::new();
        assert!(!store.bucket_exists("b").await.unwrap());
        store.create_bucket("b").await.unwrap();
        assert!(store.bucket_exists("b").await.unwrap());
        assert_eq!(store.list_buckets().await.unwrap(), vec!["b".to_string()]);
        store.delete_bucket("b").await.unwrap();
        assert!(!store.bucket_exists("b").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_nonempty_bucket_fails() {
        let store = store_with_keys("b", &["k"]).await;
        assert!(store.delete_bucket("b").await.is_err());
        store.remove_object("b", "k").await.unwrap();
        store.delete_bucket("b").await.unwrap();
    }

    #[tokio::test]
    async fn test_delimiter_listing_groups_prefixes() {
        let store = store_with_keys(
            "b",
            &[
                "ds/a/1.png",
                "ds/a/2.png",
                "ds/b/1.png",
                "ds/top.txt",
                "other/x",
            ],
        )
        .await;

        let entries = store.list_objects("b", "ds/", false).await.unwrap();
        let keys: Vec<(&str, bool)> = entries
            .iter()
            .map(|e| (e.key.as_str(), e.is_prefix))
            .collect();
        assert_eq!(
            keys,
            vec![("ds/a/", true), ("ds/b/", true), ("ds/top.txt", false)]
        );

        let recursive = store.list_objects("b", "ds/", true).await.unwrap();
        assert_eq!(recursive.len(), 4);
        assert!(recursive.iter().all(|e| !e.is_prefix));
    }

    #[tokio::test]
    async fn test_metadata_round_trip() {
        let store = store_with_keys("b", &[]).await;
        let mut meta = HashMap::new();
        meta.insert("patient".to_string(), "anonymized".to_string());
        store
            .put_object("b", "scan.png", Bytes::from_static(b"img"), Some(meta))
            .await
            .unwrap();

        let stat = store.stat_object("b", "scan.png").await.unwrap().unwrap();
        assert_eq!(stat.size, 3);
        assert_eq!(stat.metadata.get("patient").unwrap(), "anonymized");
        assert!(store.stat_object("b", "missing").await.unwrap().is_none());
    }
}

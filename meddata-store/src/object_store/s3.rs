use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{ObjectEntry, ObjectStat, ObjectStore};
use crate::config::StoreConfig;
use crate::errors::StoreError;

/// Object store backed by an S3-compatible server (MinIO).
///
/// Path-style addressing is forced because MinIO does not serve
/// virtual-hosted bucket URLs by default.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Build a client from the given configuration
    pub fn new(config: &StoreConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "meddata",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint_url())
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
        }
    }

    /// Wrap an existing SDK client (used by tests against localstack-style servers)
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn backend_err<E>(err: E) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StoreError::Backend(format!("{}", DisplayErrorContext(&err)))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                if err.as_service_error().map(|e| e.is_not_found()) == Some(true) {
                    Ok(false)
                } else {
                    Err(backend_err(err))
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(backend_err)?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(backend_err)?;
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        let resp = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(backend_err)?;
        Ok(resp
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<(), StoreError> {
        debug!("put_object {}/{} ({} bytes)", bucket, key, data.len());
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .set_metadata(metadata)
            .send()
            .await
            .map_err(backend_err)?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        let resp = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(resp) => resp,
            Err(err) => {
                if err.as_service_error().map(|e| e.is_no_such_key()) == Some(true) {
                    return Err(StoreError::ObjectNotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    });
                }
                return Err(backend_err(err));
            }
        };

        let data = resp.body.collect().await.map_err(backend_err)?;
        Ok(data.into_bytes())
    }

    async fn stat_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectStat>, StoreError> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(resp) => {
                let last_modified = resp
                    .last_modified()
                    .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()));
                Ok(Some(ObjectStat {
                    key: key.to_string(),
                    size: resp.content_length().unwrap_or(0).max(0) as u64,
                    last_modified,
                    metadata: resp.metadata().cloned().unwrap_or_default(),
                }))
            }
            Err(err) => {
                if err.as_service_error().map(|e| e.is_not_found()) == Some(true) {
                    Ok(None)
                } else {
                    Err(backend_err(err))
                }
            }
        }
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(backend_err)?;
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<ObjectEntry>, StoreError> {
        let mut entries = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take());
            if !recursive {
                request = request.delimiter("/");
            }

            let resp = request.send().await.map_err(backend_err)?;

            for common in resp.common_prefixes() {
                if let Some(p) = common.prefix() {
                    entries.push(ObjectEntry {
                        key: p.to_string(),
                        size: 0,
                        is_prefix: true,
                    });
                }
            }
            for object in resp.contents() {
                if let Some(key) = object.key() {
                    entries.push(ObjectEntry {
                        key: key.to_string(),
                        size: object.size().unwrap_or(0).max(0) as u64,
                        is_prefix: false,
                    });
                }
            }

            if resp.is_truncated() == Some(true) {
                continuation = resp.next_continuation_token().map(str::to_string);
                if continuation.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(entries)
    }
}

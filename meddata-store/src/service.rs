//! High-level dataset operations over an [`ObjectStore`].
//!
//! Every public method validates its name components and runs the
//! existence checks outer-to-inner (bucket, dataset, class, sample), so a
//! missing resource always surfaces as the matching not-found error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, instrument};

use crate::archive::{self, DatasetShape};
use crate::errors::StoreError;
use crate::keys;
use crate::object_store::ObjectStore;

/// Service the API layer drives; cheap to clone
#[derive(Clone)]
pub struct DatasetStore {
    store: Arc<dyn ObjectStore>,
    export_dir: PathBuf,
}

impl DatasetStore {
    pub fn new(store: Arc<dyn ObjectStore>, export_dir: PathBuf) -> Self {
        Self { store, export_dir }
    }

    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    // ----- existence checks -----

    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        keys::validate_component("bucket", bucket)?;
        if self.store.bucket_exists(bucket).await? {
            Ok(())
        } else {
            Err(StoreError::BucketNotFound(bucket.to_string()))
        }
    }

    async fn ensure_dataset(&self, bucket: &str, dataset: &str) -> Result<(), StoreError> {
        keys::validate_component("dataset", dataset)?;
        let prefix = keys::dataset_prefix(dataset);
        let entries = self.store.list_objects(bucket, &prefix, false).await?;
        if entries.is_empty() {
            Err(StoreError::DatasetNotFound {
                bucket: bucket.to_string(),
                dataset: dataset.to_string(),
            })
        } else {
            Ok(())
        }
    }

    async fn ensure_class(
        &self,
        bucket: &str,
        dataset: &str,
        class: &str,
    ) -> Result<(), StoreError> {
        keys::validate_component("class", class)?;
        let prefix = keys::class_prefix(dataset, class);
        let entries = self.store.list_objects(bucket, &prefix, false).await?;
        if entries.is_empty() {
            Err(StoreError::ClassNotFound {
                bucket: bucket.to_string(),
                dataset: dataset.to_string(),
                class: class.to_string(),
            })
        } else {
            Ok(())
        }
    }

    async fn ensure_sample(
        &self,
        bucket: &str,
        dataset: &str,
        class: &str,
        sample: &str,
    ) -> Result<(), StoreError> {
        keys::validate_component("sample", sample)?;
        let key = keys::sample_key(dataset, class, sample);
        if self.store.stat_object(bucket, &key).await?.is_some() {
            Ok(())
        } else {
            Err(StoreError::SampleNotFound {
                bucket: bucket.to_string(),
                dataset: dataset.to_string(),
                class: class.to_string(),
                sample: sample.to_string(),
            })
        }
    }

    // ----- buckets -----

    /// Create a bucket. Returns `false` if it already existed.
    #[instrument(skip(self))]
    pub async fn create_bucket(&self, bucket: &str) -> Result<bool, StoreError> {
        keys::validate_component("bucket", bucket)?;
        if self.store.bucket_exists(bucket).await? {
            return Ok(false);
        }
        self.store.create_bucket(bucket).await?;
        info!("Bucket '{}' created", bucket);
        Ok(true)
    }

    /// Delete a bucket, draining its objects first.
    #[instrument(skip(self))]
    pub async fn delete_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        self.ensure_bucket(bucket).await?;
        let entries = self.store.list_objects(bucket, "", true).await?;
        for entry in entries {
            self.store.remove_object(bucket, &entry.key).await?;
        }
        self.store.delete_bucket(bucket).await?;
        info!("Bucket '{}' deleted", bucket);
        Ok(())
    }

    pub async fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        self.store.list_buckets().await
    }

    // ----- datasets -----

    /// Validate a dataset archive and upload its contents. Nothing is
    /// written unless the whole archive validates. Returns the number of
    /// objects uploaded.
    #[instrument(skip(self, archive_bytes))]
    pub async fn upload_dataset(
        &self,
        bucket: &str,
        archive_bytes: &[u8],
        shape: DatasetShape,
    ) -> Result<usize, StoreError> {
        self.ensure_bucket(bucket).await?;
        let entries = archive::validate_dataset_archive(archive_bytes, shape)?;
        let count = entries.len();
        for entry in entries {
            self.store
                .put_object(bucket, &entry.key, entry.data, None)
                .await?;
        }
        info!("Uploaded dataset archive with {} objects to '{}'", count, bucket);
        Ok(count)
    }

    /// Top-level dataset names in a bucket
    #[instrument(skip(self))]
    pub async fn list_datasets(&self, bucket: &str) -> Result<Vec<String>, StoreError> {
        self.ensure_bucket(bucket).await?;
        let entries = self.store.list_objects(bucket, "", false).await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.is_prefix)
            .map(|e| keys::prefix_name(&e.key).to_string())
            .collect())
    }

    /// Download every object of a dataset into the export directory,
    /// returning the local path the files landed in.
    #[instrument(skip(self))]
    pub async fn export_dataset(&self, bucket: &str, dataset: &str) -> Result<PathBuf, StoreError> {
        self.ensure_bucket(bucket).await?;
        self.ensure_dataset(bucket, dataset).await?;

        let prefix = keys::dataset_prefix(dataset);
        let entries = self.store.list_objects(bucket, &prefix, true).await?;
        for entry in entries {
            let data = self.store.get_object(bucket, &entry.key).await?;
            self.write_export(&self.export_dir.join(&entry.key), &data)
                .await?;
        }
        Ok(self.export_dir.join(keys::prefix_name(&prefix)))
    }

    /// Remove every object under a dataset prefix
    #[instrument(skip(self))]
    pub async fn delete_dataset(&self, bucket: &str, dataset: &str) -> Result<(), StoreError> {
        self.ensure_bucket(bucket).await?;
        self.ensure_dataset(bucket, dataset).await?;

        let prefix = keys::dataset_prefix(dataset);
        let entries = self.store.list_objects(bucket, &prefix, true).await?;
        for entry in entries {
            self.store.remove_object(bucket, &entry.key).await?;
        }
        info!("Dataset '{}' deleted from bucket '{}'", dataset, bucket);
        Ok(())
    }

    /// Upload every file of an archive below its top level, without
    /// structure validation. Returns the number of objects uploaded.
    #[instrument(skip(self, archive_bytes))]
    pub async fn upload_archive_unchecked(
        &self,
        bucket: &str,
        archive_bytes: &[u8],
    ) -> Result<usize, StoreError> {
        self.ensure_bucket(bucket).await?;
        let entries = archive::collect_archive_entries(archive_bytes)?;
        let count = entries.len();
        for entry in entries {
            self.store
                .put_object(bucket, &entry.key, entry.data, None)
                .await?;
        }
        Ok(count)
    }

    // ----- classes -----

    /// Validate a single-class archive and upload it under the dataset.
    #[instrument(skip(self, archive_bytes))]
    pub async fn upload_class(
        &self,
        bucket: &str,
        dataset: &str,
        class: &str,
        archive_bytes: &[u8],
        files_per_class: usize,
    ) -> Result<usize, StoreError> {
        self.ensure_bucket(bucket).await?;
        self.ensure_dataset(bucket, dataset).await?;
        keys::validate_component("class", class)?;

        let files = archive::validate_class_archive(archive_bytes, class, files_per_class)?;
        let count = files.len();
        for (name, data) in files {
            let key = keys::sample_key(dataset, class, &name);
            self.store.put_object(bucket, &key, data, None).await?;
        }
        info!(
            "Uploaded class '{}' ({} samples) to dataset '{}' in bucket '{}'",
            class, count, dataset, bucket
        );
        Ok(count)
    }

    /// Class names inside a dataset
    #[instrument(skip(self))]
    pub async fn list_classes(&self, bucket: &str, dataset: &str) -> Result<Vec<String>, StoreError> {
        self.ensure_bucket(bucket).await?;
        self.ensure_dataset(bucket, dataset).await?;

        let prefix = keys::dataset_prefix(dataset);
        let entries = self.store.list_objects(bucket, &prefix, false).await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.is_prefix)
            .map(|e| {
                keys::prefix_name(e.key.strip_prefix(&prefix).unwrap_or(&e.key)).to_string()
            })
            .collect())
    }

    /// Download a class's samples into the export directory
    #[instrument(skip(self))]
    pub async fn export_class(
        &self,
        bucket: &str,
        dataset: &str,
        class: &str,
    ) -> Result<PathBuf, StoreError> {
        self.ensure_bucket(bucket).await?;
        self.ensure_dataset(bucket, dataset).await?;
        self.ensure_class(bucket, dataset, class).await?;

        let prefix = keys::class_prefix(dataset, class);
        let target = self.export_dir.join(class);
        let entries = self.store.list_objects(bucket, &prefix, true).await?;
        for entry in entries {
            let relative = entry.key.strip_prefix(&prefix).unwrap_or(&entry.key);
            let data = self.store.get_object(bucket, &entry.key).await?;
            self.write_export(&target.join(relative), &data).await?;
        }
        Ok(target)
    }

    #[instrument(skip(self))]
    pub async fn delete_class(
        &self,
        bucket: &str,
        dataset: &str,
        class: &str,
    ) -> Result<(), StoreError> {
        self.ensure_bucket(bucket).await?;
        self.ensure_dataset(bucket, dataset).await?;
        self.ensure_class(bucket, dataset, class).await?;

        let prefix = keys::class_prefix(dataset, class);
        let entries = self.store.list_objects(bucket, &prefix, true).await?;
        for entry in entries {
            self.store.remove_object(bucket, &entry.key).await?;
        }
        info!(
            "Class '{}' deleted from dataset '{}' in bucket '{}'",
            class, dataset, bucket
        );
        Ok(())
    }

    // ----- samples -----

    /// Sample names inside a class, with the class prefix stripped
    #[instrument(skip(self))]
    pub async fn list_samples(
        &self,
        bucket: &str,
        dataset: &str,
        class: &str,
    ) -> Result<Vec<String>, StoreError> {
        self.ensure_bucket(bucket).await?;
        self.ensure_dataset(bucket, dataset).await?;
        self.ensure_class(bucket, dataset, class).await?;

        let prefix = keys::class_prefix(dataset, class);
        let entries = self.store.list_objects(bucket, &prefix, true).await?;
        Ok(entries
            .into_iter()
            .filter(|e| !e.is_prefix)
            .map(|e| e.key.strip_prefix(&prefix).unwrap_or(&e.key).to_string())
            .collect())
    }

    /// Bytes of a single sample
    #[instrument(skip(self))]
    pub async fn fetch_sample(
        &self,
        bucket: &str,
        dataset: &str,
        class: &str,
        sample: &str,
    ) -> Result<Bytes, StoreError> {
        self.ensure_bucket(bucket).await?;
        self.ensure_dataset(bucket, dataset).await?;
        self.ensure_class(bucket, dataset, class).await?;
        self.ensure_sample(bucket, dataset, class, sample).await?;

        let key = keys::sample_key(dataset, class, sample);
        self.store.get_object(bucket, &key).await
    }

    #[instrument(skip(self))]
    pub async fn delete_sample(
        &self,
        bucket: &str,
        dataset: &str,
        class: &str,
        sample: &str,
    ) -> Result<(), StoreError> {
        self.ensure_bucket(bucket).await?;
        self.ensure_dataset(bucket, dataset).await?;
        self.ensure_class(bucket, dataset, class).await?;
        self.ensure_sample(bucket, dataset, class, sample).await?;

        let key = keys::sample_key(dataset, class, sample);
        self.store.remove_object(bucket, &key).await?;
        info!("Sample '{}' deleted from '{}'", sample, bucket);
        Ok(())
    }

    // ----- files -----

    /// Store a file at the bucket root with optional caller metadata.
    /// Returns `true` when an existing object was overwritten.
    #[instrument(skip(self, data, metadata))]
    pub async fn put_file(
        &self,
        bucket: &str,
        file_name: &str,
        data: Bytes,
        metadata: Option<String>,
    ) -> Result<bool, StoreError> {
        self.ensure_bucket(bucket).await?;
        keys::validate_component("file", file_name)?;

        let existed = self.store.stat_object(bucket, file_name).await?.is_some();
        let user_metadata = metadata.map(|value| {
            let mut map = HashMap::new();
            map.insert("metadata".to_string(), value);
            map
        });
        self.store
            .put_object(bucket, file_name, data, user_metadata)
            .await?;

        if existed {
            info!("File '{}' was overwritten in bucket '{}'", file_name, bucket);
        } else {
            info!("File '{}' uploaded to bucket '{}'", file_name, bucket);
        }
        Ok(existed)
    }

    /// Download a bucket-root file into the export directory
    #[instrument(skip(self))]
    pub async fn export_file(&self, bucket: &str, file_name: &str) -> Result<PathBuf, StoreError> {
        self.ensure_bucket(bucket).await?;
        keys::validate_component("file", file_name)?;

        let data = self.store.get_object(bucket, file_name).await?;
        let target = self.export_dir.join(file_name);
        self.write_export(&target, &data).await?;
        Ok(target)
    }

    #[instrument(skip(self))]
    pub async fn delete_file(&self, bucket: &str, file_name: &str) -> Result<(), StoreError> {
        self.ensure_bucket(bucket).await?;
        keys::validate_component("file", file_name)?;
        if self.store.stat_object(bucket, file_name).await?.is_none() {
            return Err(StoreError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: file_name.to_string(),
            });
        }

        self.store.remove_object(bucket, file_name).await?;
        info!("File '{}' deleted from bucket '{}'", file_name, bucket);
        Ok(())
    }

    async fn write_export(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, data).await?;
        Ok(())
    }
}

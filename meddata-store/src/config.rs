use std::path::PathBuf;

use crate::errors::StoreError;

/// Object-store connection settings, loaded from the environment
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// host:port of the MinIO/S3 endpoint
    pub endpoint: String,
    /// Access key for the object store
    pub access_key: String,
    /// Secret key for the object store
    pub secret_key: String,
    /// Whether to connect over HTTPS
    pub secure: bool,
    /// Region name passed to the SDK
    pub region: String,
    /// Local directory server-side downloads are written to
    pub export_dir: PathBuf,
}

impl StoreConfig {
    /// Load configuration from `MINIO_*` environment variables.
    ///
    /// Endpoint and both credentials are required; everything else has a
    /// default. `MINIO_SECURE` accepts `true`/`1` (case-insensitive).
    pub fn from_env() -> Result<Self, StoreError> {
        let endpoint = required_var("MINIO_ENDPOINT")?;
        let access_key = required_var("MINIO_ACCESS_KEY")?;
        let secret_key = required_var("MINIO_SECRET_KEY")?;

        let secure = std::env::var("MINIO_SECURE")
            .map(|v| {
                let v = v.to_lowercase();
                v == "true" || v == "1"
            })
            .unwrap_or(false);

        let region = std::env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let export_dir = std::env::var("EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"));

        Ok(Self {
            endpoint,
            access_key,
            secret_key,
            secure,
            region,
            export_dir,
        })
    }

    /// Full endpoint URL, with the scheme picked by the `secure` flag
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.endpoint)
    }
}

fn required_var(name: &str) -> Result<String, StoreError> {
    std::env::var(name).map_err(|_| {
        StoreError::Config(format!(
            "MinIO configuration is missing in the environment variables: {} is not set",
            name
        ))
    })
}

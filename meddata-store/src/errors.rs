use thiserror::Error;

/// Error type for object-store and dataset operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Configuration error (missing or malformed environment variables)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bucket not found
    #[error("Bucket '{0}' does not exist.")]
    BucketNotFound(String),

    /// Dataset not found
    #[error("Dataset '{dataset}' does not exist in bucket '{bucket}'.")]
    DatasetNotFound { bucket: String, dataset: String },

    /// Class not found
    #[error("Class '{class}' does not exist in dataset '{dataset}' of bucket '{bucket}'.")]
    ClassNotFound {
        bucket: String,
        dataset: String,
        class: String,
    },

    /// Sample not found
    #[error("Sample '{sample}' does not exist in class '{class}' of dataset '{dataset}' in bucket '{bucket}'.")]
    SampleNotFound {
        bucket: String,
        dataset: String,
        class: String,
        sample: String,
    },

    /// Object not found at a bucket-root key
    #[error("File '{key}' does not exist in bucket '{bucket}'.")]
    ObjectNotFound { bucket: String, key: String },

    /// Invalid bucket, dataset, class, or sample name
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Archive failed structure validation
    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    /// Error returned by the object-store backend
    #[error("Object store error: {0}")]
    Backend(String),

    /// ZIP parsing error
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Local filesystem error during export
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// True for the not-found family of errors
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::BucketNotFound(_)
                | StoreError::DatasetNotFound { .. }
                | StoreError::ClassNotFound { .. }
                | StoreError::SampleNotFound { .. }
                | StoreError::ObjectNotFound { .. }
        )
    }

    /// True for errors the caller caused (bad names, bad archives)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidName(_) | StoreError::InvalidArchive(_) | StoreError::Zip(_)
        )
    }
}

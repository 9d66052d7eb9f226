use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// All buckets on the object store
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BucketListResponse {
    pub buckets: Vec<String>,
}

/// Top-level datasets in a bucket
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatasetListResponse {
    pub datasets: Vec<String>,
}

/// Classes inside a dataset
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClassListResponse {
    pub classes: Vec<String>,
}

/// Samples inside a class
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SampleListResponse {
    pub samples: Vec<String>,
}

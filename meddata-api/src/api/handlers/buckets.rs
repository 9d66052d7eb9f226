use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{info, instrument};

use meddata_store::DatasetStore;

use crate::entities::common::{ApiError, ErrorResponse, MessageResponse};
use crate::entities::listings::BucketListResponse;

/// Create a bucket; succeeds quietly when it already exists
#[utoipa::path(
    post,
    path = "/create-bucket/{bucket_name}",
    params(
        ("bucket_name" = String, Path, description = "Name of the bucket to create")
    ),
    responses(
        (status = 200, description = "Bucket created or already present", body = MessageResponse),
        (status = 400, description = "Invalid bucket name", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "buckets"
)]
#[instrument(skip(store))]
pub async fn create_bucket(
    State(store): State<DatasetStore>,
    Path(bucket_name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let created = store.create_bucket(&bucket_name).await?;
    let message = if created {
        format!("Bucket '{}' created successfully.", bucket_name)
    } else {
        format!("Bucket '{}' already exists.", bucket_name)
    };
    Ok((StatusCode::OK, Json(MessageResponse::new(message))))
}

/// Delete a bucket and everything in it
#[utoipa::path(
    delete,
    path = "/delete-bucket/{bucket_name}",
    params(
        ("bucket_name" = String, Path, description = "Name of the bucket to delete")
    ),
    responses(
        (status = 200, description = "Bucket deleted", body = MessageResponse),
        (status = 404, description = "Bucket not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "buckets"
)]
#[instrument(skip(store))]
pub async fn delete_bucket(
    State(store): State<DatasetStore>,
    Path(bucket_name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    store.delete_bucket(&bucket_name).await?;
    info!("Bucket '{}' deleted", bucket_name);
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new(format!(
            "Bucket '{}' deleted successfully.",
            bucket_name
        ))),
    ))
}

/// List all buckets
#[utoipa::path(
    get,
    path = "/list-buckets",
    responses(
        (status = 200, description = "Bucket names", body = BucketListResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "buckets"
)]
#[instrument(skip(store))]
pub async fn list_buckets(
    State(store): State<DatasetStore>,
) -> Result<impl IntoResponse, ApiError> {
    let buckets = store.list_buckets().await?;
    Ok((StatusCode::OK, Json(BucketListResponse { buckets })))
}

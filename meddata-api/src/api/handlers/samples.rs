use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::instrument;

use meddata_store::DatasetStore;

use crate::entities::common::{ApiError, ErrorResponse, MessageResponse};
use crate::entities::listings::SampleListResponse;

/// List the samples in a class
#[utoipa::path(
    get,
    path = "/get-all-samples-in-class/{bucket_name}/{dataset_name}/{class_name}",
    params(
        ("bucket_name" = String, Path, description = "Source bucket"),
        ("dataset_name" = String, Path, description = "Dataset the class belongs to"),
        ("class_name" = String, Path, description = "Class to list")
    ),
    responses(
        (status = 200, description = "Sample names", body = SampleListResponse),
        (status = 404, description = "Bucket, dataset, or class not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "samples"
)]
#[instrument(skip(store))]
pub async fn list_samples(
    State(store): State<DatasetStore>,
    Path((bucket_name, dataset_name, class_name)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let samples = store
        .list_samples(&bucket_name, &dataset_name, &class_name)
        .await?;
    Ok((StatusCode::OK, Json(SampleListResponse { samples })))
}

/// Download a single sample as a file attachment
#[utoipa::path(
    get,
    path = "/download-sample/{bucket_name}/{dataset_name}/{class_name}/{sample_name}",
    params(
        ("bucket_name" = String, Path, description = "Source bucket"),
        ("dataset_name" = String, Path, description = "Dataset the class belongs to"),
        ("class_name" = String, Path, description = "Class the sample belongs to"),
        ("sample_name" = String, Path, description = "Sample file to download")
    ),
    responses(
        (status = 200, description = "Sample bytes"),
        (status = 404, description = "Bucket, dataset, class, or sample not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "samples"
)]
#[instrument(skip(store))]
pub async fn download_sample(
    State(store): State<DatasetStore>,
    Path((bucket_name, dataset_name, class_name, sample_name)): Path<(
        String,
        String,
        String,
        String,
    )>,
) -> Result<impl IntoResponse, ApiError> {
    let data = store
        .fetch_sample(&bucket_name, &dataset_name, &class_name, &sample_name)
        .await?;

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", sample_name),
        ),
    ];
    Ok((StatusCode::OK, headers, data))
}

/// Delete a single sample
#[utoipa::path(
    delete,
    path = "/delete-sample/{bucket_name}/{dataset_name}/{class_name}/{sample_name}",
    params(
        ("bucket_name" = String, Path, description = "Source bucket"),
        ("dataset_name" = String, Path, description = "Dataset the class belongs to"),
        ("class_name" = String, Path, description = "Class the sample belongs to"),
        ("sample_name" = String, Path, description = "Sample file to delete")
    ),
    responses(
        (status = 200, description = "Sample deleted", body = MessageResponse),
        (status = 404, description = "Bucket, dataset, class, or sample not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "samples"
)]
#[instrument(skip(store))]
pub async fn delete_sample(
    State(store): State<DatasetStore>,
    Path((bucket_name, dataset_name, class_name, sample_name)): Path<(
        String,
        String,
        String,
        String,
    )>,
) -> Result<impl IntoResponse, ApiError> {
    store
        .delete_sample(&bucket_name, &dataset_name, &class_name, &sample_name)
        .await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new(format!(
            "Sample '{}' deleted successfully from class '{}'.",
            sample_name, class_name
        ))),
    ))
}

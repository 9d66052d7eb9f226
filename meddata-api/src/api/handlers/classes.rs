use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::IntoParams;

use meddata_store::DatasetStore;

use super::{read_upload, require_zip, zip_stem};
use crate::entities::common::{ApiError, ErrorResponse, ExportResponse, MessageResponse, UploadResponse};
use crate::entities::listings::ClassListResponse;

/// Expected sample count for an uploaded class archive
#[derive(Debug, Deserialize, IntoParams)]
pub struct UploadClassParams {
    /// Number of samples the class must contain (default: 200)
    pub expected_num_files_per_class: Option<usize>,
}

/// Upload a single class into an existing dataset.
///
/// The class name is the archive filename without its `.zip` extension;
/// samples inside are renumbered to the bare-number form.
#[utoipa::path(
    post,
    path = "/upload-class/{bucket_name}/{dataset_name}",
    params(
        ("bucket_name" = String, Path, description = "Target bucket"),
        ("dataset_name" = String, Path, description = "Dataset the class belongs to"),
        UploadClassParams
    ),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Class uploaded", body = UploadResponse),
        (status = 400, description = "Archive failed validation", body = ErrorResponse),
        (status = 404, description = "Bucket or dataset not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "classes"
)]
#[instrument(skip(store, multipart))]
pub async fn upload_class(
    State(store): State<DatasetStore>,
    Path((bucket_name, dataset_name)): Path<(String, String)>,
    Query(params): Query<UploadClassParams>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_upload(multipart).await?;
    require_zip(&upload.file_name)?;
    let class_name = zip_stem(&upload.file_name).to_string();

    let files_per_class = params.expected_num_files_per_class.unwrap_or(200);
    let uploaded = store
        .upload_class(
            &bucket_name,
            &dataset_name,
            &class_name,
            &upload.data,
            files_per_class,
        )
        .await?;
    info!(
        "Class '{}' uploaded to dataset '{}' in bucket '{}'",
        class_name, dataset_name, bucket_name
    );
    Ok((
        StatusCode::OK,
        Json(UploadResponse {
            message: format!("Class '{}' uploaded successfully", class_name),
            uploaded,
        }),
    ))
}

/// List the classes in a dataset
#[utoipa::path(
    get,
    path = "/get-all-classes/{bucket_name}/{dataset_name}",
    params(
        ("bucket_name" = String, Path, description = "Source bucket"),
        ("dataset_name" = String, Path, description = "Dataset to list")
    ),
    responses(
        (status = 200, description = "Class names", body = ClassListResponse),
        (status = 404, description = "Bucket or dataset not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "classes"
)]
#[instrument(skip(store))]
pub async fn list_classes(
    State(store): State<DatasetStore>,
    Path((bucket_name, dataset_name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let classes = store.list_classes(&bucket_name, &dataset_name).await?;
    Ok((StatusCode::OK, Json(ClassListResponse { classes })))
}

/// Download a class's samples to the server's export directory
#[utoipa::path(
    get,
    path = "/download-class/{bucket_name}/{dataset_name}/{class_name}",
    params(
        ("bucket_name" = String, Path, description = "Source bucket"),
        ("dataset_name" = String, Path, description = "Dataset the class belongs to"),
        ("class_name" = String, Path, description = "Class to download")
    ),
    responses(
        (status = 200, description = "Class written locally", body = ExportResponse),
        (status = 404, description = "Bucket, dataset, or class not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "classes"
)]
#[instrument(skip(store))]
pub async fn download_class(
    State(store): State<DatasetStore>,
    Path((bucket_name, dataset_name, class_name)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let location = store
        .export_class(&bucket_name, &dataset_name, &class_name)
        .await?;
    Ok((
        StatusCode::OK,
        Json(ExportResponse {
            message: format!(
                "All files from class '{}' in dataset '{}' downloaded successfully.",
                class_name, dataset_name
            ),
            location: location.display().to_string(),
        }),
    ))
}

/// Delete a class and all its samples
#[utoipa::path(
    delete,
    path = "/delete-class/{bucket_name}/{dataset_name}/{class_name}",
    params(
        ("bucket_name" = String, Path, description = "Source bucket"),
        ("dataset_name" = String, Path, description = "Dataset the class belongs to"),
        ("class_name" = String, Path, description = "Class to delete")
    ),
    responses(
        (status = 200, description = "Class deleted", body = MessageResponse),
        (status = 404, description = "Bucket, dataset, or class not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "classes"
)]
#[instrument(skip(store))]
pub async fn delete_class(
    State(store): State<DatasetStore>,
    Path((bucket_name, dataset_name, class_name)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    store
        .delete_class(&bucket_name, &dataset_name, &class_name)
        .await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new(format!(
            "Class '{}' deleted successfully from dataset '{}' in bucket '{}'.",
            class_name, dataset_name, bucket_name
        ))),
    ))
}

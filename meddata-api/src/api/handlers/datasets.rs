use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::IntoParams;

use meddata_store::{DatasetShape, DatasetStore};

use super::{read_upload, require_zip};
use crate::entities::common::{ApiError, ErrorResponse, ExportResponse, MessageResponse, UploadResponse};
use crate::entities::listings::DatasetListResponse;

/// Expected shape of an uploaded dataset archive
#[derive(Debug, Deserialize, IntoParams)]
pub struct UploadDatasetParams {
    /// Number of class folders the archive must contain (default: 4)
    pub expected_num_classes: Option<usize>,

    /// Number of samples each class must contain (default: 200)
    pub expected_num_files_per_class: Option<usize>,
}

impl UploadDatasetParams {
    fn shape(&self) -> DatasetShape {
        let default = DatasetShape::default();
        DatasetShape {
            expected_classes: self.expected_num_classes.unwrap_or(default.expected_classes),
            files_per_class: self
                .expected_num_files_per_class
                .unwrap_or(default.files_per_class),
        }
    }
}

/// Upload a dataset archive, validating its structure first
#[utoipa::path(
    post,
    path = "/upload-zip/{bucket_name}",
    params(
        ("bucket_name" = String, Path, description = "Target bucket"),
        UploadDatasetParams
    ),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Dataset uploaded", body = UploadResponse),
        (status = 400, description = "Archive failed validation", body = ErrorResponse),
        (status = 404, description = "Bucket not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "datasets"
)]
#[instrument(skip(store, multipart))]
pub async fn upload_dataset(
    State(store): State<DatasetStore>,
    Path(bucket_name): Path<String>,
    Query(params): Query<UploadDatasetParams>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_upload(multipart).await?;
    require_zip(&upload.file_name)?;

    let uploaded = store
        .upload_dataset(&bucket_name, &upload.data, params.shape())
        .await?;
    info!(
        "Dataset archive '{}' uploaded to bucket '{}'",
        upload.file_name, bucket_name
    );
    Ok((
        StatusCode::OK,
        Json(UploadResponse {
            message: "Dataset uploaded successfully".to_string(),
            uploaded,
        }),
    ))
}

/// Upload an arbitrary archive without structure validation
#[utoipa::path(
    post,
    path = "/upload-directory/{bucket_name}",
    params(
        ("bucket_name" = String, Path, description = "Target bucket")
    ),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Archive contents uploaded", body = UploadResponse),
        (status = 400, description = "Not a ZIP archive", body = ErrorResponse),
        (status = 404, description = "Bucket not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "datasets"
)]
#[instrument(skip(store, multipart))]
pub async fn upload_directory(
    State(store): State<DatasetStore>,
    Path(bucket_name): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_upload(multipart).await?;
    require_zip(&upload.file_name)?;

    let uploaded = store
        .upload_archive_unchecked(&bucket_name, &upload.data)
        .await?;
    Ok((
        StatusCode::OK,
        Json(UploadResponse {
            message: "Directory uploaded successfully".to_string(),
            uploaded,
        }),
    ))
}

/// List the datasets in a bucket
#[utoipa::path(
    get,
    path = "/get-all-databases/{bucket_name}",
    params(
        ("bucket_name" = String, Path, description = "Bucket to list")
    ),
    responses(
        (status = 200, description = "Dataset names", body = DatasetListResponse),
        (status = 404, description = "Bucket not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "datasets"
)]
#[instrument(skip(store))]
pub async fn list_datasets(
    State(store): State<DatasetStore>,
    Path(bucket_name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let datasets = store.list_datasets(&bucket_name).await?;
    Ok((StatusCode::OK, Json(DatasetListResponse { datasets })))
}

/// Download a dataset to the server's export directory
#[utoipa::path(
    get,
    path = "/download-database/{bucket_name}/{dataset_name}",
    params(
        ("bucket_name" = String, Path, description = "Source bucket"),
        ("dataset_name" = String, Path, description = "Dataset to download")
    ),
    responses(
        (status = 200, description = "Dataset written locally", body = ExportResponse),
        (status = 404, description = "Bucket or dataset not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "datasets"
)]
#[instrument(skip(store))]
pub async fn download_dataset(
    State(store): State<DatasetStore>,
    Path((bucket_name, dataset_name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let location = store.export_dataset(&bucket_name, &dataset_name).await?;
    Ok((
        StatusCode::OK,
        Json(ExportResponse {
            message: format!(
                "All files from dataset '{}' downloaded successfully.",
                dataset_name
            ),
            location: location.display().to_string(),
        }),
    ))
}

/// Delete a dataset and all its objects
#[utoipa::path(
    delete,
    path = "/delete-database/{bucket_name}/{dataset_name}",
    params(
        ("bucket_name" = String, Path, description = "Source bucket"),
        ("dataset_name" = String, Path, description = "Dataset to delete")
    ),
    responses(
        (status = 200, description = "Dataset deleted", body = MessageResponse),
        (status = 404, description = "Bucket or dataset not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "datasets"
)]
#[instrument(skip(store))]
pub async fn delete_dataset(
    State(store): State<DatasetStore>,
    Path((bucket_name, dataset_name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    store.delete_dataset(&bucket_name, &dataset_name).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new(format!(
            "Dataset '{}' deleted successfully from bucket '{}'.",
            dataset_name, bucket_name
        ))),
    ))
}

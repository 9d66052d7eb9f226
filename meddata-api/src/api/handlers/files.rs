use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::instrument;

use meddata_store::DatasetStore;

use super::read_upload;
use crate::entities::common::{ApiError, ErrorResponse, ExportResponse, MessageResponse};

/// Upload a single file to the bucket root.
///
/// The multipart form takes a `file` part and an optional `metadata` text
/// field stored as user metadata on the object. Re-uploading an existing
/// name overwrites it and says so in the response.
#[utoipa::path(
    post,
    path = "/upload-file/{bucket_name}",
    params(
        ("bucket_name" = String, Path, description = "Target bucket")
    ),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = MessageResponse),
        (status = 400, description = "Malformed upload", body = ErrorResponse),
        (status = 404, description = "Bucket not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "files"
)]
#[instrument(skip(store, multipart))]
pub async fn upload_file(
    State(store): State<DatasetStore>,
    Path(bucket_name): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_upload(multipart).await?;
    let overwritten = store
        .put_file(
            &bucket_name,
            &upload.file_name,
            upload.data,
            upload.metadata,
        )
        .await?;

    let message = if overwritten {
        format!(
            "File '{}' already existed and was overwritten.",
            upload.file_name
        )
    } else {
        "File uploaded successfully.".to_string()
    };
    Ok((StatusCode::OK, Json(MessageResponse::new(message))))
}

/// Download a bucket-root file to the server's export directory
#[utoipa::path(
    get,
    path = "/download-file/{bucket_name}/{file_name}",
    params(
        ("bucket_name" = String, Path, description = "Source bucket"),
        ("file_name" = String, Path, description = "File to download")
    ),
    responses(
        (status = 200, description = "File written locally", body = ExportResponse),
        (status = 404, description = "Bucket or file not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "files"
)]
#[instrument(skip(store))]
pub async fn download_file(
    State(store): State<DatasetStore>,
    Path((bucket_name, file_name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let location = store.export_file(&bucket_name, &file_name).await?;
    Ok((
        StatusCode::OK,
        Json(ExportResponse {
            message: "File downloaded successfully.".to_string(),
            location: location.display().to_string(),
        }),
    ))
}

/// Delete a bucket-root file
#[utoipa::path(
    delete,
    path = "/delete-file/{bucket_name}/{file_name}",
    params(
        ("bucket_name" = String, Path, description = "Source bucket"),
        ("file_name" = String, Path, description = "File to delete")
    ),
    responses(
        (status = 200, description = "File deleted", body = MessageResponse),
        (status = 404, description = "Bucket or file not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "files"
)]
#[instrument(skip(store))]
pub async fn delete_file(
    State(store): State<DatasetStore>,
    Path((bucket_name, file_name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    store.delete_file(&bucket_name, &file_name).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new(format!(
            "File '{}' deleted successfully.",
            file_name
        ))),
    ))
}

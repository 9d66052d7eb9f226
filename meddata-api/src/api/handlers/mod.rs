pub mod buckets;
pub mod classes;
pub mod datasets;
pub mod files;
pub mod health;
pub mod samples;

// Tests module
#[cfg(test)]
mod tests;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::entities::common::ApiError;

/// A file received through a multipart form, plus the optional `metadata`
/// text field that may accompany it
pub(crate) struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
    pub metadata: Option<String>,
}

/// Read the `file` part (and optional `metadata` field) out of a multipart
/// request
pub(crate) async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut metadata: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart request: {}", e)))?
    {
        let field_name = field.name().unwrap_or("unknown").to_string();
        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some((file_name, data));
            }
            "metadata" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read metadata: {}", e)))?;
                metadata = Some(value);
            }
            _ => {}
        }
    }

    let (file_name, data) =
        file.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("Empty file provided".to_string()));
    }

    Ok(UploadedFile {
        file_name,
        data,
        metadata,
    })
}

/// Reject uploads whose filename does not end in `.zip`
pub(crate) fn require_zip(file_name: &str) -> Result<(), ApiError> {
    if file_name.to_lowercase().ends_with(".zip") {
        Ok(())
    } else {
        Err(ApiError::BadRequest("File is not a zip.".to_string()))
    }
}

/// Archive name without the `.zip` extension
pub(crate) fn zip_stem(file_name: &str) -> &str {
    file_name
        .strip_suffix(".zip")
        .or_else(|| file_name.strip_suffix(".ZIP"))
        .unwrap_or(file_name)
}

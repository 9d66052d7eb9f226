use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;

use meddata_store::StoreError;

/// Error response format for the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn not_found(message: &str) -> Self {
        Self {
            error: "not_found".to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self {
            error: "bad_request".to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn internal_error() -> Self {
        Self {
            error: "internal_error".to_string(),
            message: "An unexpected error occurred".to_string(),
            details: None,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = match self.error.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Handler error: wraps storage failures and request-shape problems and
/// turns them into the right status code
#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    BadRequest(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                warn!("Bad request: {}", message);
                ErrorResponse::bad_request(&message).into_response()
            }
            ApiError::Store(err) if err.is_not_found() => {
                warn!("{}", err);
                ErrorResponse::not_found(&err.to_string()).into_response()
            }
            ApiError::Store(err) if err.is_client_error() => {
                warn!("{}", err);
                ErrorResponse::bad_request(&err.to_string()).into_response()
            }
            ApiError::Store(err) => {
                error!("Storage operation failed: {}", err);
                ErrorResponse::internal_error().into_response()
            }
        }
    }
}

/// Simple message-only success response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Success response for server-side downloads, reporting where the files
/// were written
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExportResponse {
    pub message: String,
    /// Local path the objects were written to
    pub location: String,
}

/// Success response for archive uploads
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    /// Number of objects written to the store
    pub uploaded: usize,
}

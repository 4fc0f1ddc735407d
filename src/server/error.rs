use crate::utils::error::ReportError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid or missing API Key")]
    Unauthorized,

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Report(err) => match err {
                ReportError::TableError { .. } | ReportError::ValidationError { .. } => (
                    StatusCode::BAD_REQUEST,
                    format!("Error generating PDF: {}", err),
                ),
                ReportError::StorageError { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error uploading PDF to object storage.".to_string(),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error generating PDF: {}", err),
                ),
            },
        };

        if status.is_server_error() {
            tracing::error!("❌ Request failed: {}", self);
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

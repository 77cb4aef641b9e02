use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::middleware::logging::current_request_id;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("File too large: {size}MB exceeds limit of {limit}MB")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Invalid file format: {message}")]
    InvalidFile { message: String },

    #[error("Could not read PDF: {message}")]
    ExtractionError { message: String },

    #[error("No text could be extracted from the document")]
    EmptyText,

    #[error("Rate limit exceeded: maximum concurrent analyses reached")]
    RateLimitExceeded,

    #[error("Model inference failed: {message}")]
    InferenceError { message: String },

    #[error("Failed to load model: {message}")]
    ModelLoadError { message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Missing or invalid content type")]
    InvalidContentType,

    #[error("Missing file in request")]
    MissingFile,

    #[error("Validation error: {message}")]
    ValidationError { message: String },

}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::InvalidFile { .. } => "INVALID_FILE",
            AppError::ExtractionError { .. } => "EXTRACTION_ERROR",
            AppError::EmptyText => "EMPTY_TEXT",
            AppError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            AppError::InferenceError { .. } => "INFERENCE_ERROR",
            AppError::ModelLoadError { .. } => "MODEL_LOAD_ERROR",
            AppError::Timeout => "REQUEST_TIMEOUT",
            AppError::Internal { .. } => "INTERNAL_ERROR",
            AppError::InvalidContentType => "INVALID_CONTENT_TYPE",
            AppError::MissingFile => "MISSING_FILE",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InvalidFile { .. } => StatusCode::BAD_REQUEST,
            AppError::ExtractionError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EmptyText => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::InferenceError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ModelLoadError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidContentType => StatusCode::BAD_REQUEST,
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();
        let request_id = current_request_id().unwrap_or_else(|| Uuid::new_v4().to_string());
        let timestamp = chrono::Utc::now().to_rfc3339();

        // Halts on unreadable or empty documents are user errors, not faults
        if status.is_server_error() {
            tracing::error!(
                error_code = error_code,
                status_code = %status,
                request_id = %request_id,
                error_message = %message,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                error_code = error_code,
                status_code = %status,
                request_id = %request_id,
                error_message = %message,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
                "request_id": request_id,
                "timestamp": timestamp
            },
            "data": null
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal {
            message: format!("{:#}", err),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError {
            message: format!("JSON parsing error: {}", err),
        }
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal {
            message: format!("Analysis task failed: {}", err),
        }
    }
}

// Helper methods for creating specific errors
impl AppError {
    pub fn extraction(message: impl Into<String>) -> Self {
        AppError::ExtractionError {
            message: message.into(),
        }
    }

    pub fn inference(message: impl Into<String>) -> Self {
        AppError::InferenceError {
            message: message.into(),
        }
    }

    pub fn model_load(message: impl Into<String>) -> Self {
        AppError::ModelLoadError {
            message: message.into(),
        }
    }
}

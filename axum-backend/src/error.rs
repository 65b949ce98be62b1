use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("No file selected")]
    NoFileSelected,
    #[error("Invalid file type. Please use JPG, PNG, or PDF files.")]
    InvalidFileType,
    #[error("File size is too large (max {max_mb}MB)")]
    FileTooLarge { max_mb: usize },
    #[error("Malformed upload: {0}")]
    InvalidUpload(String),
    #[error("No file uploaded")]
    NoFileUploaded,
    #[error("No conversion result available")]
    NoResult,
    #[error("Invalid file name")]
    InvalidFilename,
    #[error("File not found")]
    NotFound,
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NoFileSelected
            | AppError::InvalidFileType
            | AppError::FileTooLarge { .. }
            | AppError::InvalidUpload(_)
            | AppError::NoFileUploaded
            | AppError::InvalidFilename => StatusCode::BAD_REQUEST,
            AppError::NoResult => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::ConversionFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::Io(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::NoFileSelected => "NO_FILE_SELECTED",
            AppError::InvalidFileType => "INVALID_FILE_TYPE",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::InvalidUpload(_) => "INVALID_UPLOAD",
            AppError::NoFileUploaded => "NO_FILE_UPLOADED",
            AppError::NoResult => "NO_RESULT",
            AppError::InvalidFilename => "INVALID_FILENAME",
            AppError::NotFound => "NOT_FOUND",
            AppError::ConversionFailed(_) => "CONVERSION_FAILED",
            AppError::Io(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Internal failures are logged but not echoed to the client
    fn user_message(&self) -> String {
        match self {
            AppError::Io(_) | AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl AppError {
    /// A body that trips the request size limit is reported as an oversized file
    pub fn from_multipart(err: MultipartError, max_upload_bytes: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::file_too_large(max_upload_bytes)
        } else {
            AppError::InvalidUpload(err.body_text())
        }
    }

    pub fn file_too_large(max_upload_bytes: usize) -> Self {
        AppError::FileTooLarge {
            max_mb: max_upload_bytes / (1024 * 1024),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.code().to_string(),
                message: self.user_message(),
            }),
        )
            .into_response()
    }
}

//! # Error Handling and Response Types
//!
//! This module defines the error taxonomy of the repository server and how each
//! error maps onto an HTTP status code.
//!
//! ## Key Types
//!
//! - [`AppError`]: Main error enum covering all failures surfaced to a client
//! - [`ApiErrorResponse`]: JSON error body returned with every failed request
//! - [`ErrorCode`]: Machine-readable error classification
//! - [`AppResult<T>`]: Convenience alias for results using `AppError`
//!
//! ## Error Classifications
//!
//! - **Validation Errors** (400 Bad Request): malformed uploads, descriptors
//!   missing required fields, invalid coordinates
//! - **Forbidden** (403): writes against a read-only repository
//! - **Not Found** (404): unknown coordinates, files or stylesheet
//! - **Method Not Allowed** (405): anything other than GET/HEAD/PUT
//! - **Upload Errors** (413 Payload Too Large): uploads above the size limit
//! - **Storage Errors** (500): I/O failures of the backing store
//!
//! None of these are retried by the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::descriptor::DescriptorError;
use crate::validation::ValidationError;

/// JSON body sent with every error response
#[derive(Serialize, Debug)]
pub struct ApiErrorResponse {
    pub error: String,          // Human-readable error message
    pub code: String,           // Machine-readable error code
    pub details: Option<Value>, // Additional error details
    pub timestamp: String,      // ISO 8601 timestamp
}

/// Error code classification for machine-readable error types
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorCode {
    ValidationError,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    UploadError,
    StorageError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::NotFound => "not_found",
            ErrorCode::MethodNotAllowed => "method_not_allowed",
            ErrorCode::UploadError => "upload_error",
            ErrorCode::StorageError => "storage_error",
            ErrorCode::InternalError => "internal_error",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::UploadError => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::StorageError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Application-specific error types with error codes
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid descriptor: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("XML generation error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid coordinate: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("{0}")]
    UploadError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    /// Get the appropriate error code for this error type
    pub fn error_code(&self) -> ErrorCode {
        match self {
            AppError::BadRequest(_)
            | AppError::Json(_)
            | AppError::Descriptor(_)
            | AppError::Validation(_) => ErrorCode::ValidationError,
            AppError::Forbidden(_) => ErrorCode::Forbidden,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::MethodNotAllowed(_) => ErrorCode::MethodNotAllowed,
            AppError::UploadError(_) => ErrorCode::UploadError,
            AppError::Io(_) => ErrorCode::StorageError,
            AppError::Xml(_) | AppError::InternalError(_) | AppError::Anyhow(_) => {
                ErrorCode::InternalError
            }
        }
    }

    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        self.error_code().http_status()
    }

    /// Get additional error details if available
    pub fn details(&self) -> Option<Value> {
        match self {
            AppError::Anyhow(e) => e
                .source()
                .map(|source| json!({"source": source.to_string()})),
            AppError::Io(e) => Some(json!({"kind": format!("{:?}", e.kind())})),
            _ => None,
        }
    }

    /// Create a standardized error response
    pub fn to_error_response(&self) -> ApiErrorResponse {
        let code = self.error_code();
        ApiErrorResponse {
            error: self.to_string(),
            code: code.as_str().to_string(),
            details: self.details(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Maven clients request missing files constantly; keep those quiet.
        match self.error_code() {
            ErrorCode::NotFound => tracing::debug!(error = %self, "Request failed"),
            ErrorCode::StorageError | ErrorCode::InternalError => {
                tracing::error!(error = %self, "Request failed")
            }
            _ => tracing::warn!(error = %self, "Request failed"),
        }

        let error_response = self.to_error_response();
        tracing::debug!(status = %status, code = %error_response.code, "Returning standardized error response");

        (status, axum::Json(error_response)).into_response()
    }
}

/// Convenient result type for application operations.
pub type AppResult<T> = Result<T, AppError>;

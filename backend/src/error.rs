//! Error handling for the Rubber Group Operations Platform
//!
//! Every failure maps to a single JSON error body; a failed recording always
//! means "no change occurred" and is safe to resubmit.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors (rejected before any write)
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("No grade mapping configured for output grade {output_grade_id}")]
    UnmappedGrade { output_grade_id: Uuid },

    #[error("Invalid reference: {0}")]
    ReferenceNotFound(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    // Business logic errors
    #[error(
        "Loading of {requested} exceeds remaining balance {remaining} on contract {contract_no}"
    )]
    ExceedsContractBalance {
        contract_no: String,
        remaining: Decimal,
        requested: Decimal,
    },

    // Recording failures: the whole transaction was rolled back, nothing was
    // persisted, and the underlying cause is attached
    #[error("Reception recording failed")]
    ReceptionRecordingFailed(#[source] Box<AppError>),

    #[error("Processing recording failed")]
    ProcessingRecordingFailed(#[source] Box<AppError>),

    #[error("Ledger write failed")]
    LedgerWriteFailed(#[source] sqlx::Error),

    // External service errors
    #[error("Phasing service error: {0}")]
    ExternalService(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::UnmappedGrade { output_grade_id } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "UNMAPPED_GRADE".to_string(),
                    message: format!(
                        "No grade mapping configured for output grade {}",
                        output_grade_id
                    ),
                    field: Some("output_grade_id".to_string()),
                },
            ),
            AppError::ReferenceNotFound(reference) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_REFERENCE".to_string(),
                    message: format!("Invalid reference: {}", reference),
                    field: Some(reference.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::DuplicateEntry(entity) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message: format!("A record with this {} already exists", entity),
                    field: Some(entity.clone()),
                },
            ),
            AppError::ExceedsContractBalance {
                contract_no,
                remaining,
                requested,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "EXCEEDS_CONTRACT_BALANCE".to_string(),
                    message: format!(
                        "Loading of {} exceeds remaining balance {} on contract {}",
                        requested, remaining, contract_no
                    ),
                    field: Some("qty".to_string()),
                },
            ),
            AppError::ReceptionRecordingFailed(cause) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "RECEPTION_RECORDING_FAILED".to_string(),
                    message: format!("Reception recording failed: {}", cause),
                    field: None,
                },
            ),
            AppError::ProcessingRecordingFailed(cause) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "PROCESSING_RECORDING_FAILED".to_string(),
                    message: format!("Processing recording failed: {}", cause),
                    field: None,
                },
            ),
            AppError::LedgerWriteFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "LEDGER_WRITE_FAILED".to_string(),
                    message: "Ledger write failed".to_string(),
                    field: None,
                },
            ),
            AppError::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "EXTERNAL_SERVICE_ERROR".to_string(),
                    message: format!("Phasing service error: {}", msg),
                    field: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message: format!("Configuration error: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

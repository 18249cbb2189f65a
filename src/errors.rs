// src/errors.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    // Upload structure errors
    #[error("Upload file is not readable as CSV: {0}")]
    CsvParse(#[from] csv::Error),

    #[error("Required columns missing from upload: {missing:?} (found: {found:?})")]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    // Business logic errors
    #[error("Work month {0} is already payment-confirmed")]
    AlreadyConfirmed(String),

    #[error("No salary records exist for work month {0}")]
    NothingToConfirm(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::CsvParse(_)
            | AppError::MissingColumns { .. } => StatusCode::BAD_REQUEST,
            AppError::AlreadyConfirmed(_) | AppError::NothingToConfirm(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

// Convenience alias
pub type AppResult<T> = Result<T, AppError>;

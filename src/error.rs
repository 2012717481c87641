use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::ledger::LedgerError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bulk import rolled back: {0}")]
    ImportFailed(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::SlotUnavailable(_) => {
                AppError::SlotUnavailable("This slot is no longer available".to_string())
            }
            LedgerError::InvalidSlot(e) => AppError::Validation(e.to_string()),
            e @ LedgerError::FreeClaim(_) => AppError::Validation(e.to_string()),
            LedgerError::Storage(e) => AppError::Database(e),
            e @ LedgerError::ImportAborted { .. } => AppError::ImportFailed(e.to_string()),
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        AppError::Session(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::SlotUnavailable(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Access denied".to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Incorrect password".to_string())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            AppError::ImportFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Bulk import failed, no records were applied".to_string(),
            ),
            AppError::Session(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Session error".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        }

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

//! Sugar API: error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sugar_core::error::DomainError;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The word deck could not be loaded.
    #[error("word deck error: {0}")]
    Deck(DomainError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// The payload sent to clients for this error.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let (_, error) = self.status_and_code();
        ErrorBody {
            error,
            message: self.0.to_string(),
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            DomainError::RoomUnavailable(_) => (StatusCode::CONFLICT, "room_unavailable"),
            DomainError::AlreadyStarted(_) => (StatusCode::CONFLICT, "already_started"),
            DomainError::RoundNotComplete { .. } => (StatusCode::CONFLICT, "round_not_complete"),
            DomainError::StaleRound { .. } => (StatusCode::CONFLICT, "stale_round"),
            DomainError::ConcurrencyConflict { .. } => {
                (StatusCode::CONFLICT, "concurrency_conflict")
            }
            DomainError::PreconditionFailed { .. } => {
                (StatusCode::CONFLICT, "precondition_failed")
            }
            DomainError::NotPermitted(_) => (StatusCode::FORBIDDEN, "not_permitted"),
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            DomainError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
            }
            DomainError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();
        (status, Json(self.body())).into_response()
    }
}

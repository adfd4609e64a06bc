use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::allocator::BookingError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Database(#[from] anyhow::Error),

    #[error("requested slots are unavailable")]
    SlotUnavailable { conflicting: Vec<String> },

    #[error("invalid slot selection: {0}")]
    InvalidSelection(String),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("{0} already exists")]
    Duplicate(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden")]
    Forbidden,

    #[error("unauthorized")]
    Unauthorized,
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::SlotUnavailable { conflicting } => {
                AppError::SlotUnavailable { conflicting }
            }
            BookingError::InvalidSelection(msg) => AppError::InvalidSelection(msg),
            BookingError::TurfNotFound(id) => AppError::NotFound(format!("turf {id}")),
            BookingError::BookingNotFound(id) => AppError::NotFound(format!("booking {id}")),
            BookingError::InvalidTransition { from, to } => {
                AppError::Conflict(format!("booking is {from}, cannot change to {to}"))
            }
            BookingError::Forbidden => AppError::Forbidden,
            BookingError::Database(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::SlotUnavailable { .. } => StatusCode::CONFLICT,
            AppError::InvalidSelection(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Duplicate(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        let body = match &self {
            AppError::SlotUnavailable { conflicting } => serde_json::json!({
                "error": self.to_string(),
                "reason": "slot_unavailable",
                "conflicting_slots": conflicting,
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        (status, axum::Json(body)).into_response()
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::scheduling::SchedulingError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("record store error: {0}")]
    Store(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("scheduling conflict: {0}")]
    SchedulingConflict(String),

    #[error("invalid status transition: {0}")]
    InvalidStatusTransition(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::ServiceNotFound(_) => AppError::NotFound(err.to_string()),
            SchedulingError::Conflict { .. } => AppError::SchedulingConflict(err.to_string()),
            SchedulingError::InvalidStatusTransition { .. } => {
                AppError::InvalidStatusTransition(err.to_string())
            }
            SchedulingError::CrossesMidnight { .. }
            | SchedulingError::OutsideSchedule { .. }
            | SchedulingError::InvalidTime(_)
            | SchedulingError::InvalidSchedule(_) => AppError::Validation(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::SchedulingConflict(_) => StatusCode::CONFLICT,
            AppError::InvalidStatusTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

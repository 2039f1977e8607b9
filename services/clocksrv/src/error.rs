//! Error handling for clocksrv
//!
//! Core errors become the shared `ErrorResponse` body with a matching status.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::response::{IntoResponse, Response};
use common::AppError;
use thiserror::Error;
use tracing::error;
use wakeup_alarms::AlarmError;

/// Result type for clocksrv
pub type Result<T> = std::result::Result<T, ClockSrvError>;

#[derive(Debug, Error)]
pub enum ClockSrvError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Alarm(#[from] AlarmError),
}

impl From<figment::Error> for ClockSrvError {
    fn from(err: figment::Error) -> Self {
        ClockSrvError::Config(err.to_string())
    }
}

impl From<JsonRejection> for ClockSrvError {
    fn from(rejection: JsonRejection) -> Self {
        ClockSrvError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ClockSrvError {
    fn from(rejection: PathRejection) -> Self {
        ClockSrvError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ClockSrvError {
    fn from(rejection: QueryRejection) -> Self {
        ClockSrvError::BadRequest(rejection.body_text())
    }
}

impl From<ClockSrvError> for AppError {
    fn from(err: ClockSrvError) -> Self {
        match err {
            ClockSrvError::BadRequest(msg) => AppError::bad_request(msg),
            ClockSrvError::Alarm(e) if e.is_not_found() => AppError::not_found(e.to_string()),
            ClockSrvError::Alarm(AlarmError::InvalidInput(msg)) => AppError::bad_request(msg),
            other => {
                error!("Request failed: {}", other);
                AppError::internal_error("Internal server error").with_details(other.to_string())
            },
        }
    }
}

impl IntoResponse for ClockSrvError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

//! HTTP-facing error type.
//!
//! Services return `ApiError`; the axum layer turns it into a status code
//! and a `{"detail": ...}` body. Domain errors map by class, everything
//! infrastructural is a 500 with the detail kept out of the response body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use bilet_cache::BindError;
use bilet_core::CoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("cache misuse: {0}")]
    CacheMisuse(#[from] BindError),

    #[error("database error: {0}")]
    Database(String),

    #[error("queue error: {0}")]
    Queue(String),
}

impl ApiError {
    pub fn database(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }

    pub fn queue(err: impl std::fmt::Display) -> Self {
        Self::Queue(err.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Core(core) if core.is_auth_error() => StatusCode::UNAUTHORIZED,
            Self::Core(CoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Core(CoreError::LoginTaken | CoreError::TicketTypeExists) => {
                StatusCode::BAD_REQUEST
            }
            Self::Core(CoreError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx_core::error::Error> for ApiError {
    fn from(err: sqlx_core::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "internal server error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::from(CoreError::TokenMissing).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(CoreError::not_found("Event")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(CoreError::LoginTaken).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Database("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

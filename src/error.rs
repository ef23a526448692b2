//! API error handling.
//!
//! A single error type covers the handler layer; its `IntoResponse` impl maps
//! every variant to a JSON body of the shape `{"detail": ..., "status_code"}`.
//! Database errors carry their own enum (`DbError` lives in the db module for
//! sqlx proximity) and are converted here.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::db::DbError;

/// Errors surfaced to API clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("API key missing. Provide the X-API-Key header")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error(transparent)]
    Db(#[from] DbError),
}

impl ApiError {
    /// Static error code string for log labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::MissingApiKey => "missing_api_key",
            Self::InvalidApiKey => "invalid_api_key",
            Self::Db(e) => e.error_code(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::MissingApiKey | Self::InvalidApiKey => StatusCode::UNAUTHORIZED,
            Self::Db(e) => {
                if e.is_internal() {
                    StatusCode::INTERNAL_SERVER_ERROR
                } else {
                    // Domain refusals (missing reference, dependent rows,
                    // depth cap) are client errors.
                    StatusCode::BAD_REQUEST
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal detail goes to the log, never to the client.
            tracing::error!(error = %self, code = self.error_code(), "internal error");
            let body = json!({
                "detail": "Internal server error",
                "message": "An unexpected error occurred",
            });
            return (status, Json(body)).into_response();
        }

        let body = json!({
            "detail": self.to_string(),
            "status_code": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::error::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Request understood but the data cannot be processed (422)
    #[error("{0}")]
    Unprocessable(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        match err {
            Error::Config(_) | Error::InvalidInput(_) => ApiError::BadRequest(message),
            Error::Analysis(_) => ApiError::Unprocessable(message),
            Error::NotFound(_) => ApiError::NotFound(message),
            Error::Common(sab_common::Error::InvalidInput(_)) => ApiError::BadRequest(message),
            _ => ApiError::Internal(message),
        }
    }
}

impl From<sab_common::Error> for ApiError {
    fn from(err: sab_common::Error) -> Self {
        Error::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

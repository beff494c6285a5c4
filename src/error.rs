//! Closed set of failures returned by the services, and their HTTP mapping.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::auth::token::InvalidToken;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("user with this login already exists")]
    AlreadyExists,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("missing or malformed Authorization header")]
    MissingToken,

    #[error("not found")]
    NotFound,

    #[error("store failure")]
    Store(#[from] StoreError),

    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::MissingToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<InvalidToken> for AppError {
    fn from(_: InvalidToken) -> Self {
        AppError::InvalidToken
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::Validation(details) => serde_json::json!({
                "message": "validation error",
                "details": details,
            }),
            AppError::Store(e) => {
                error!(error = %e, source = ?std::error::Error::source(e), "store failure");
                serde_json::json!({ "message": "internal server error" })
            }
            AppError::Internal(e) => {
                error!(error = ?e, "internal failure");
                serde_json::json!({ "message": "internal server error" })
            }
            other => serde_json::json!({ "message": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

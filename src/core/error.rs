// Centralized error handling for the sheet server

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::models::api::{ErrorResponse, MessageResponse};

/// Failures of the underlying document store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to connect to document store: {0}")]
    Connect(String),

    #[error("Timed out after {0:?} connecting to document store")]
    Timeout(Duration),

    #[error("Write-ahead log failure: {0}")]
    Wal(#[from] anyhow::Error),
}

/// Errors returned by the JSON API handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// `message` is what the caller sees; `source` is only logged
    #[error("{message}")]
    Store {
        message: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn store(message: &'static str, source: StoreError) -> Self {
        ApiError::Store { message, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self {
            ApiError::Store { message, source } => {
                error!(error = %source, "{}", message);
            }
            ApiError::Internal(detail) => {
                error!(error = %detail, "Internal server error");
            }
            _ => {}
        }

        let message = match &self {
            ApiError::Internal(_) => "Internal Server Error".to_string(),
            _ => self.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

/// Rejections produced by the auth gate
///
/// Every variant maps to 403. Token rejections answer with a JSON envelope,
/// session rejections with plain text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Access denied")]
    MissingToken,

    #[error("Invalid token")]
    MalformedToken,

    #[error("Invalid token")]
    InvalidSignature,

    #[error("Invalid token")]
    Expired { expired_at: i64, current_time: i64 },

    #[error("Access denied. Please log in.")]
    MissingSession,

    #[error("Access denied. Please log in.")]
    InvalidSession,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = StatusCode::FORBIDDEN;

        match &self {
            AuthError::InvalidSignature | AuthError::InvalidSession => {
                warn!(reason = ?self, status = status.as_u16(), "Authentication failed");
            }
            _ => {
                debug!(reason = ?self, status = status.as_u16(), "Authentication failed");
            }
        }

        match self {
            AuthError::MissingSession | AuthError::InvalidSession => (
                status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                self.to_string(),
            )
                .into_response(),
            _ => (
                status,
                Json(MessageResponse {
                    message: self.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashFailed(String),

    #[error("Invalid password hash format")]
    InvalidHash,
}

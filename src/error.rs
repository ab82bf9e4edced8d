//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::ml::ModelError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Auth errors
    InvalidCredentials,
    TokenExpired,
    TokenInvalid,
    Unauthorized,

    // Resource errors
    NotFound(String),
    AlreadyExists(String),

    // Validation errors
    ValidationError(String),

    // Database errors
    DatabaseError(String),

    // Model errors
    ModelError(String),

    // Chat errors
    ChatNotConfigured,
    ChatUpstreamError(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid username/email or password"),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token has expired"),
            AppError::TokenInvalid => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::AlreadyExists(msg) => (StatusCode::CONFLICT, msg.as_str()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error occurred")
            }
            AppError::ModelError(msg) => {
                tracing::error!("Model error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Model inference failed")
            }
            AppError::ChatNotConfigured => {
                (StatusCode::SERVICE_UNAVAILABLE, "Chat assistant is not configured")
            }
            AppError::ChatUpstreamError(msg) => {
                tracing::error!("Chat upstream error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Chat assistant is unavailable")
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        AppError::TokenInvalid
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            // Bad uploads are the caller's to fix, not server faults; the
            // server-side path stays in the logs only
            ModelError::ImageMissing(path) => {
                tracing::warn!("Uploaded image missing at {}", path.display());
                AppError::ValidationError("Image file not found".to_string())
            }
            ModelError::ImageUnreadable(_) => AppError::ValidationError(err.to_string()),
            _ => AppError::ModelError(err.to_string()),
        }
    }
}

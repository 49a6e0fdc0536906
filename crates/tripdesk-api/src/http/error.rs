//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use tripdesk_types::error::{ChatError, UserError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat-related errors.
    Chat(ChatError),
    /// User directory errors.
    User(UserError),
    /// Authentication failure.
    Unauthorized(String),
    /// Authenticated but lacking admin privilege.
    Forbidden(String),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        AppError::User(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Chat(ChatError::SessionNotFound) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                "Session not found".to_string(),
            ),
            AppError::Chat(ChatError::UserNotFound) => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "Target user not found".to_string(),
            ),
            AppError::Chat(ChatError::EmptyContent) | AppError::Chat(ChatError::TargetRequired) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", self_message(&self))
            }
            AppError::Chat(ChatError::AdminRequired) => (
                StatusCode::FORBIDDEN,
                "ADMIN_REQUIRED",
                "Admin privilege required".to_string(),
            ),
            AppError::Chat(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CHAT_ERROR",
                e.to_string(),
            ),
            AppError::User(UserError::NotFound) => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ),
            AppError::User(UserError::UsernameConflict(name)) => (
                StatusCode::CONFLICT,
                "USERNAME_CONFLICT",
                format!("Username '{name}' already exists"),
            ),
            AppError::User(UserError::EmailConflict(email)) => (
                StatusCode::CONFLICT,
                "EMAIL_CONFLICT",
                format!("Email '{email}' already exists"),
            ),
            AppError::User(UserError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid username or password".to_string(),
            ),
            AppError::User(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "USER_ERROR",
                e.to_string(),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

fn self_message(err: &AppError) -> String {
    match err {
        AppError::Chat(e) => e.to_string(),
        AppError::User(e) => e.to_string(),
        AppError::Unauthorized(m)
        | AppError::Forbidden(m)
        | AppError::Validation(m)
        | AppError::Internal(m) => m.clone(),
    }
}

//! Access-token authentication extractor.
//!
//! Extracts and verifies bearer tokens from:
//! - `Authorization: Bearer <token>` header
//! - `X-API-Key: <token>` header
//! - `token=<token>` query parameter (WebSocket clients in browsers
//!   cannot set headers on the upgrade request)
//!
//! Tokens are SHA-256 hashed and resolved against the `access_tokens`
//! table joined to the user directory; extracting `CurrentUser` yields
//! the full principal.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use tripdesk_infra::auth::token::lookup_token;
use tripdesk_types::user::User;

use crate::http::error::AppError;
use crate::state::AppState;

/// Authenticated principal. Extracting this validates the access token.
pub struct CurrentUser {
    pub user: User,
}

impl CurrentUser {
    /// Refuse non-admin principals.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.user.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin privilege required".to_string()))
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;

        let user = lookup_token(&state.db_pool, &token)
            .await
            .map_err(|e| AppError::Internal(format!("Database error: {e}")))?;

        match user {
            Some(user) => Ok(CurrentUser { user }),
            None => Err(AppError::Unauthorized(
                "Invalid access token. Provide a valid token via 'Authorization: Bearer <token>', 'X-API-Key: <token>', or the 'token' query parameter.".to_string(),
            )),
        }
    }
}

/// Extract the access token from request headers or the query string.
fn extract_token(parts: &Parts) -> Result<String, AppError> {
    // Try Authorization: Bearer <token>
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    // Try X-API-Key header
    if let Some(key) = parts.headers.get("x-api-key") {
        let key_str = key.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return Ok(key_str.trim().to_string());
    }

    // Try the query string (WebSocket upgrade requests)
    if let Some(query) = parts.uri.query() {
        for pair in query.split('&') {
            if let Some(token) = pair.strip_prefix("token=") {
                if !token.is_empty() {
                    return Ok(token.to_string());
                }
            }
        }
    }

    Err(AppError::Unauthorized(
        "Missing access token. Provide via 'Authorization: Bearer <token>', 'X-API-Key: <token>', or the 'token' query parameter.".to_string(),
    ))
}

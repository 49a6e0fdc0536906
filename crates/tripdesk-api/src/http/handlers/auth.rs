//! Account registration and login handlers.
//!
//! Endpoints:
//! - POST /api/v1/auth/register - Create an account
//! - POST /api/v1/auth/login    - Verify credentials and issue a token

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use tripdesk_core::user::repository::UserRepository;
use tripdesk_infra::auth::password::{hash_password, verify_password};
use tripdesk_infra::auth::token::issue_token;
use tripdesk_types::error::UserError;
use tripdesk_types::user::User;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/v1/auth/register - Create a non-admin account.
///
/// Admin accounts are provisioned via the CLI, never over the API.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let username = req.username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("Username must not be empty".to_string()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash =
        hash_password(&req.password).map_err(|e| AppError::Internal(e.to_string()))?;

    let user = User {
        id: Uuid::now_v7(),
        username: username.to_string(),
        email: req.email.trim().to_string(),
        password_hash,
        full_name: req.full_name,
        is_admin: false,
        created_at: Utc::now(),
    };
    let created = state
        .user_repo
        .create_user(&user)
        .await
        .map_err(UserError::from)?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(
        serde_json::to_value(&created).map_err(|e| AppError::Internal(e.to_string()))?,
        request_id,
        elapsed,
    );
    Ok(Json(resp))
}

/// POST /api/v1/auth/login - Verify credentials and issue an access token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let user = state
        .user_repo
        .get_user_by_username(req.username.trim())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or(AppError::User(UserError::InvalidCredentials))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(AppError::User(UserError::InvalidCredentials));
    }

    let token = issue_token(&state.db_pool, &user.id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(
        serde_json::json!({
            "token": token,
            "user": user,
        }),
        request_id,
        elapsed,
    );
    Ok(Json(resp))
}

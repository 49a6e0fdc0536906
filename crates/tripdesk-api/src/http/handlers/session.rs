//! Chat session read-side handlers: dashboard listing, thread history,
//! and unread counts.
//!
//! Endpoints:
//! - GET /api/v1/chat/sessions                - Active sessions by last activity (admin)
//! - GET /api/v1/chat/sessions/{id}/messages  - Thread history (admin or owner)
//! - GET /api/v1/chat/thread                  - Caller's own thread, created if absent
//! - GET /api/v1/chat/users/{user_id}/thread  - A user's thread, created if absent (admin)
//! - GET /api/v1/chat/unread                  - Unread counts for the calling role

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use tripdesk_core::chat::repository::ChatRepository;
use tripdesk_core::user::repository::UserRepository;
use tripdesk_types::chat::ChatRole;
use tripdesk_types::error::ChatError;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for session listing.
#[derive(Debug, Deserialize)]
pub struct SessionListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Query parameters for message listing.
#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    #[serde(default = "default_message_limit")]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

fn default_message_limit() -> Option<i64> {
    Some(100)
}

/// GET /api/v1/chat/sessions - Active sessions ordered by last activity,
/// each with the admin-facing unread count.
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: CurrentUser,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<ApiResponse<Vec<serde_json::Value>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();
    auth.require_admin()?;

    let sessions = state
        .chat_service
        .list_active_sessions(Some(query.limit), Some(query.offset))
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let sessions_json: Vec<serde_json::Value> = sessions
        .iter()
        .map(|s| serde_json::to_value(s).unwrap())
        .collect();

    let resp = ApiResponse::success(sessions_json, request_id, elapsed)
        .with_link("self", "/api/v1/chat/sessions");
    Ok(Json(resp))
}

/// GET /api/v1/chat/sessions/{id}/messages - Thread history.
///
/// Admins may read any thread; a user may read only their own.
pub async fn get_messages(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(session_id): Path<Uuid>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<ApiResponse<Vec<serde_json::Value>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let session = state
        .chat_service
        .chat_repo()
        .get_session(&session_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or(AppError::Chat(ChatError::SessionNotFound))?;

    if !auth.user.is_admin && session.user_id != auth.user.id {
        return Err(AppError::Forbidden(
            "Cannot read another user's thread".to_string(),
        ));
    }

    let messages = state
        .chat_service
        .get_messages(&session_id, query.limit, query.offset)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let messages_json: Vec<serde_json::Value> = messages
        .iter()
        .map(|m| serde_json::to_value(m).unwrap())
        .collect();

    let resp = ApiResponse::success(messages_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/chat/sessions/{session_id}/messages"));
    Ok(Json(resp))
}

/// GET /api/v1/chat/thread - The caller's own thread, created lazily on
/// first visit so a thread renders before any message exists.
pub async fn get_own_thread(
    State(state): State<AppState>,
    auth: CurrentUser,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let session = state.chat_service.get_or_create_session(&auth.user.id).await?;
    let messages = state
        .chat_service
        .get_messages(&session.id, default_message_limit(), None)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(
        serde_json::json!({ "session": session, "messages": messages }),
        request_id,
        elapsed,
    )
    .with_link("messages", &format!("/api/v1/chat/sessions/{}/messages", session.id));
    Ok(Json(resp))
}

/// GET /api/v1/chat/users/{user_id}/thread - Open a user's thread from the
/// dashboard, creating the session if the user never messaged.
pub async fn get_user_thread(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();
    auth.require_admin()?;

    // Refuse unknown users rather than creating an orphan session.
    state
        .user_repo
        .get_user(&user_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or(AppError::Chat(ChatError::UserNotFound))?;

    let session = state.chat_service.get_or_create_session(&user_id).await?;
    let messages = state
        .chat_service
        .get_messages(&session.id, default_message_limit(), None)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(
        serde_json::json!({ "session": session, "messages": messages }),
        request_id,
        elapsed,
    );
    Ok(Json(resp))
}

/// GET /api/v1/chat/unread - Unread counts for the calling role.
///
/// A user gets the unread count of their own thread; an admin gets the
/// per-session counts backing the dashboard badges.
pub async fn get_unread(
    State(state): State<AppState>,
    auth: CurrentUser,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let data = if auth.user.is_admin {
        let sessions = state.chat_service.list_active_sessions(None, None).await?;
        let per_session: Vec<serde_json::Value> = sessions
            .iter()
            .map(|s| {
                serde_json::json!({
                    "session_id": s.session.id,
                    "unread": s.unread,
                })
            })
            .collect();
        serde_json::json!({ "role": ChatRole::Admin, "sessions": per_session })
    } else {
        let unread = state.chat_service.unread_for_user(&auth.user.id).await?;
        serde_json::json!({ "role": ChatRole::User, "unread": unread })
    };

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}

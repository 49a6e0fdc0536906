//! ChatRepository trait definition.
//!
//! Persistence operations for chat sessions and messages. Implementations
//! live in tripdesk-infra (e.g., `SqliteChatRepository`).
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use tripdesk_types::chat::{ChatMessage, ChatRole, ChatSession, SessionOverview};
use tripdesk_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Repository trait for chat session and message persistence.
pub trait ChatRepository: Send + Sync {
    /// Return the user's active session, creating one atomically when absent.
    ///
    /// Implementations must make concurrent first calls for the same user
    /// converge on a single row (unique constraint or equivalent upsert).
    fn find_or_create_active_session(
        &self,
        user_id: &Uuid,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Get a session by its unique ID.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Get the active session for a user, if any.
    fn get_active_session_for_user(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Bump a session's last-activity timestamp.
    fn touch_session(
        &self,
        session_id: &Uuid,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List active sessions ordered by last activity DESC, each with the
    /// admin-facing unread count (dashboard query).
    fn list_active_sessions(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<SessionOverview>, RepositoryError>> + Send;

    /// Delete a session and, by cascade, its messages.
    fn delete_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Save a new message within a session.
    fn save_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get messages for a session, ordered by created_at ASC.
    fn get_messages(
        &self,
        session_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Flip every unread counterpart-authored message in the session to
    /// read, as a single bulk update. Returns the number of rows flipped.
    fn mark_counterpart_read(
        &self,
        session_id: &Uuid,
        viewer: ChatRole,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Unread messages in the session authored by the viewer's counterpart.
    fn unread_count(
        &self,
        session_id: &Uuid,
        viewer: ChatRole,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;
}

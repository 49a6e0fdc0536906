//! Chat session, message, and wire-event types for Tripdesk.
//!
//! These types model support conversations between end-users and the
//! administrator pool: one session per user, messages flagged by sending
//! side, and the JSON events delivered over the WebSocket channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Which side of a conversation a principal speaks for.
///
/// A support thread always has exactly two sides: the owning user and the
/// shared administrator pool. Read tracking and unread counts are computed
/// relative to the viewing role's counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Admin,
}

impl ChatRole {
    /// The other side of the conversation.
    pub fn counterpart(self) -> Self {
        match self {
            ChatRole::User => ChatRole::Admin,
            ChatRole::Admin => ChatRole::User,
        }
    }

    /// Whether messages authored by this role carry the admin flag.
    pub fn is_admin(self) -> bool {
        matches!(self, ChatRole::Admin)
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(ChatRole::User),
            "admin" => Ok(ChatRole::Admin),
            other => Err(format!("invalid chat role: '{other}'")),
        }
    }
}

/// A support conversation thread between one user and the admin pool.
///
/// At most one session per user is active at any time; the repository
/// enforces this with a partial unique index on `(user_id) WHERE is_active`.
/// Sessions are created lazily on first message or first thread open and
/// are never explicitly closed; `last_activity_at` bumps on every message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

/// A single chat utterance.
///
/// Messages belong to exactly one session and are deleted with it.
/// `is_read` starts false and flips to true only via a bulk mark-read from
/// the counterpart side -- no code path flips it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    /// True when the administrator pool authored this message.
    pub is_admin_message: bool,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// An active session paired with its admin-facing unread count,
/// as listed on the support dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOverview {
    #[serde(flatten)]
    pub session: ChatSession,
    /// Unread messages authored by the user side.
    pub unread: u32,
}

/// The broadcast payload fanned out to echo and notify rooms.
///
/// Identical for both destinations; `sender_name` is the display name
/// resolved from the user directory at send time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub message_id: Uuid,
    pub session_id: Uuid,
    pub sender_name: String,
    pub is_admin: bool,
    pub content: String,
    /// RFC 3339 creation timestamp.
    pub timestamp: String,
    pub is_read: bool,
}

impl MessagePayload {
    /// Build the wire payload for a persisted message.
    pub fn from_message(message: &ChatMessage, sender_name: &str) -> Self {
        Self {
            message_id: message.id,
            session_id: message.session_id,
            sender_name: sender_name.to_string(),
            is_admin: message.is_admin_message,
            content: message.content.clone(),
            timestamp: message.created_at.to_rfc3339(),
            is_read: message.is_read,
        }
    }
}

/// Server-to-client events delivered over room broadcast channels.
///
/// Serialized as JSON text frames tagged by `type`, matching the names the
/// dashboard and chat widget listen for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A new message reached one of the receiver's rooms.
    ReceiveMessage(MessagePayload),
    /// The counterpart viewed the thread; unread indicators can clear.
    MessagesRead { session_id: Uuid },
}

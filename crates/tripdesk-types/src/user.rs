//! User directory types.
//!
//! The chat subsystem consumes a thin slice of the booking application's
//! user table: identity, the admin flag, and a display name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::ChatRole;

/// A registered account, end-user or administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2id hash; never serialized into API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name shown next to chat messages: full name when set, else username.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }

    /// The chat role this account speaks for.
    pub fn chat_role(&self) -> ChatRole {
        if self.is_admin {
            ChatRole::Admin
        } else {
            ChatRole::User
        }
    }
}

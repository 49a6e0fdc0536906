//! Opaque bearer tokens for REST and WebSocket authentication.
//!
//! A token is `tdesk_` plus 32 random bytes in hex, shown to the client
//! once at login; only its SHA-256 hash is stored. Lookup joins the
//! `access_tokens` table to the user directory so callers get the full
//! principal in one query.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use tripdesk_types::error::RepositoryError;
use tripdesk_types::user::User;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::sqlite::pool::DatabasePool;

/// Compute the SHA-256 hash of a token (lowercase hex).
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{digest:x}")
}

/// Generate a fresh plaintext token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    format!(
        "tdesk_{}",
        bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
    )
}

/// Issue a new token for a user and return the plaintext.
///
/// The plaintext is never stored; clients must keep it.
pub async fn issue_token(pool: &DatabasePool, user_id: &Uuid) -> Result<String, RepositoryError> {
    let token = generate_token();
    sqlx::query(
        "INSERT INTO access_tokens (id, token_hash, user_id, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(Uuid::now_v7().to_string())
    .bind(hash_token(&token))
    .bind(user_id.to_string())
    .bind(Utc::now().to_rfc3339())
    .execute(&pool.writer)
    .await
    .map_err(|e| RepositoryError::Query(e.to_string()))?;

    Ok(token)
}

/// Resolve a plaintext token to its owning user.
///
/// Returns `None` for unknown tokens. Bumps `last_used_at` best-effort;
/// a failed bump does not fail the lookup.
pub async fn lookup_token(
    pool: &DatabasePool,
    token: &str,
) -> Result<Option<User>, RepositoryError> {
    let token_hash = hash_token(token);

    let row = sqlx::query(
        r#"SELECT t.id AS token_id, u.*
           FROM access_tokens t
           JOIN users u ON u.id = t.user_id
           WHERE t.token_hash = ?"#,
    )
    .bind(&token_hash)
    .fetch_optional(&pool.reader)
    .await
    .map_err(|e| RepositoryError::Query(e.to_string()))?;

    let Some(row) = row else {
        return Ok(None);
    };

    let token_id: String = row
        .try_get("token_id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let _ = sqlx::query("UPDATE access_tokens SET last_used_at = ? WHERE id = ?")
        .bind(Utc::now().to_rfc3339())
        .bind(&token_id)
        .execute(&pool.writer)
        .await;

    let id: String = row
        .try_get("id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let is_admin: i64 = row
        .try_get("is_admin")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    let user = User {
        id: Uuid::parse_str(&id)
            .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?,
        username: row
            .try_get("username")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        email: row
            .try_get("email")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        password_hash: row
            .try_get("password_hash")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        full_name: row
            .try_get("full_name")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        is_admin: is_admin != 0,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))?,
    };

    Ok(Some(user))
}

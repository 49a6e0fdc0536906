use thiserror::Error;

/// Errors related to chat operations.
///
/// None of these escalate to a fatal condition; handlers absorb them and
/// degrade to inaction, optionally acknowledging the caller.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("session not found")]
    SessionNotFound,

    #[error("target user not found")]
    UserNotFound,

    #[error("target user id required for admin sends")]
    TargetRequired,

    #[error("message content is empty after trimming")]
    EmptyContent,

    #[error("admin privilege required")]
    AdminRequired,

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to user directory operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error("username '{0}' already exists")]
    UsernameConflict(String),

    #[error("email '{0}' already exists")]
    EmailConflict(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors from token-based authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing access token")]
    MissingToken,

    #[error("invalid access token")]
    InvalidToken,

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Errors from repository operations (used by trait definitions in tripdesk-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ChatError::SessionNotFound,
            other => ChatError::StorageError(other.to_string()),
        }
    }
}

impl From<RepositoryError> for UserError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => UserError::NotFound,
            RepositoryError::Conflict(msg) => UserError::UsernameConflict(msg),
            other => UserError::StorageError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::EmptyContent;
        assert_eq!(err.to_string(), "message content is empty after trimming");
    }

    #[test]
    fn test_user_error_display() {
        let err = UserError::UsernameConflict("karim".to_string());
        assert_eq!(err.to_string(), "username 'karim' already exists");
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_repository_not_found_maps_to_session_not_found() {
        let err: ChatError = RepositoryError::NotFound.into();
        assert!(matches!(err, ChatError::SessionNotFound));
    }
}

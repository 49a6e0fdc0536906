//! UserRepository trait definition.
//!
//! The chat subsystem's view of the user directory: lookups by id and
//! username plus account creation. Same RPITIT pattern as ChatRepository.

use tripdesk_types::error::RepositoryError;
use tripdesk_types::user::User;
use uuid::Uuid;

/// Repository trait for user directory persistence.
pub trait UserRepository: Send + Sync {
    /// Create a new account. Fails with `Conflict` on duplicate
    /// username or email.
    fn create_user(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Get a user by their unique ID.
    fn get_user(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Get a user by username (login).
    fn get_user_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Count registered accounts (status reporting).
    fn count_users(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}

//! User repository.

use crate::error::StoreResult;
use crate::models::UserRow;
use async_trait::async_trait;
use time::OffsetDateTime;

/// Repository for user records.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a new user. Fails with `Constraint` if the username is taken.
    async fn create_user(&self, username: &str, created_at: OffsetDateTime)
    -> StoreResult<UserRow>;

    /// Get a user by id.
    async fn get_user(&self, user_id: i64) -> StoreResult<Option<UserRow>>;

    /// Exact-match lookup by username.
    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<UserRow>>;
}

//! Session repository.

use crate::error::StoreResult;
use crate::models::SessionRow;
use async_trait::async_trait;
use time::OffsetDateTime;

/// Repository for login sessions.
#[async_trait]
pub trait SessionRepo: Send + Sync {
    /// Create a session for a user.
    async fn create_session(
        &self,
        user_id: i64,
        token_hash: &str,
        created_at: OffsetDateTime,
        expires_at: Option<OffsetDateTime>,
    ) -> StoreResult<SessionRow>;

    /// Look up a live session by token hash. Sessions whose expiry has passed
    /// are not returned.
    async fn get_session_by_token_hash(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<SessionRow>>;

    /// Delete a session by id.
    async fn delete_session(&self, session_id: i64) -> StoreResult<()>;

    /// Delete all sessions whose expiry has passed. Returns the number removed.
    async fn delete_expired_sessions(&self, now: OffsetDateTime) -> StoreResult<u64>;
}

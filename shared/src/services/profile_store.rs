use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{AppResult, UserProfile};

/// Capability interface over the users table. Writes are conditional on
/// the presence of the `userId` key and the store serializes them.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert only if no row with the same `user_id` exists; otherwise
    /// `ConflictError`.
    async fn insert_profile(&self, profile: &UserProfile) -> AppResult<()>;

    async fn get_profile(&self, user_id: &str) -> AppResult<Option<UserProfile>>;

    /// Set the voice and `updatedAt` only if the row exists; otherwise
    /// `NotFoundError`. Returns the row as written.
    async fn update_voice(
        &self,
        user_id: &str,
        voice_id: &str,
        updated_at: DateTime<Utc>,
    ) -> AppResult<UserProfile>;
}

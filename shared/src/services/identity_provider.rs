use async_trait::async_trait;

use crate::{AppResult, IdentityUser, NewIdentity};

/// Capability interface over the managed identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Look up an account by username. `Ok(None)` only when the provider
    /// reports the user does not exist; any other failure is an error.
    async fn find_user(&self, username: &str) -> AppResult<Option<IdentityUser>>;

    /// Create an account with pre-verified contact attributes and no
    /// welcome message. Returns the provider-assigned user id.
    ///
    /// Fails with `ConflictError` when the username is already taken.
    async fn create_user(&self, identity: &NewIdentity) -> AppResult<String>;
}

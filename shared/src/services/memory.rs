//! In-memory capability implementations for tests and local runs.
//!
//! Each operation takes the lock once and does its check-and-write under
//! it, so concurrent callers see the same conditional-write behavior the
//! real services give.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::{AppError, AppResult, IdentityProvider, IdentityUser, NewIdentity, ProfileStore, UserProfile};

fn lock<T>(mutex: &Mutex<T>) -> AppResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| AppError::InternalError("In-memory state poisoned".to_string()))
}

/// Account held by [`InMemoryIdentityProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityRecord {
    pub user_id: String,
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    users: Mutex<HashMap<String, IdentityRecord>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, username: &str) -> Option<IdentityRecord> {
        self.users.lock().ok()?.get(username).cloned()
    }

    pub fn count(&self) -> usize {
        self.users.lock().map(|users| users.len()).unwrap_or(0)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn find_user(&self, username: &str) -> AppResult<Option<IdentityUser>> {
        let users = lock(&self.users)?;
        Ok(users.get(username).map(|record| IdentityUser {
            username: username.to_string(),
            user_id: Some(record.user_id.clone()),
        }))
    }

    async fn create_user(&self, identity: &NewIdentity) -> AppResult<String> {
        let mut users = lock(&self.users)?;
        if users.contains_key(identity.username()) {
            return Err(AppError::ConflictError(
                "User with this email address already exists".to_string(),
            ));
        }

        let user_id = Uuid::new_v4().to_string();
        let attributes = identity
            .attributes()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .chain(std::iter::once(("sub".to_string(), user_id.clone())))
            .collect();

        users.insert(
            identity.username().to_string(),
            IdentityRecord {
                user_id: user_id.clone(),
                attributes,
            },
        );
        Ok(user_id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    rows: Mutex<HashMap<String, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn insert_profile(&self, profile: &UserProfile) -> AppResult<()> {
        let mut rows = lock(&self.rows)?;
        if rows.contains_key(&profile.user_id) {
            return Err(AppError::ConflictError("User already exists".to_string()));
        }
        rows.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> AppResult<Option<UserProfile>> {
        Ok(lock(&self.rows)?.get(user_id).cloned())
    }

    async fn update_voice(
        &self,
        user_id: &str,
        voice_id: &str,
        updated_at: DateTime<Utc>,
    ) -> AppResult<UserProfile> {
        let mut rows = lock(&self.rows)?;
        let row = rows
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFoundError(format!("User not found: {}", user_id)))?;

        row.selected_voice_id = voice_id.to_string();
        row.updated_at = updated_at;
        Ok(row.clone())
    }
}

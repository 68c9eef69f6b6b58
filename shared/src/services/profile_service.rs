use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    is_valid_voice_id, AppError, AppResult, ProfileStore, UpdateVoiceRequest, UserProfile,
    VoiceOption, VOICE_OPTIONS,
};

/// Reads profiles and applies voice changes to existing rows.
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
    voices: &'static [VoiceOption],
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self {
            store,
            voices: VOICE_OPTIONS,
        }
    }

    pub fn with_voices(mut self, voices: &'static [VoiceOption]) -> Self {
        self.voices = voices;
        self
    }

    pub async fn get_profile(&self, user_id: &str) -> AppResult<UserProfile> {
        self.store
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFoundError(format!("User not found: {}", user_id)))
    }

    /// Change the selected voice of an existing user. Unknown users are a
    /// `NotFoundError` and nothing is written.
    pub async fn update_voice(
        &self,
        user_id: &str,
        request: &UpdateVoiceRequest,
    ) -> AppResult<UserProfile> {
        let voice_id = request
            .selected_voice_id
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::ValidationError("Missing selectedVoiceId in request body".to_string())
            })?;

        if !is_valid_voice_id(voice_id, self.voices) {
            warn!("Rejecting unknown voice {} for user {}", voice_id, user_id);
            return Err(AppError::ValidationError(format!(
                "Invalid selectedVoiceId: {}",
                voice_id
            )));
        }

        let updated = self.store.update_voice(user_id, voice_id, Utc::now()).await?;

        info!("Voice for user {} set to {}", user_id, voice_id);
        Ok(updated)
    }
}

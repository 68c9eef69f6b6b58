use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    is_valid_email, is_valid_phone, is_valid_voice_id, AppError, AppResult, CreateUserRequest,
    IdentityProvider, NewIdentity, ProfileStore, UserProfile, VoiceOption, VOICE_OPTIONS,
};

/// A registration request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRegistration {
    pub phone_number: String,
    pub email_address: String,
    pub selected_voice_id: String,
}

/// Check a registration request without touching any external system.
///
/// Missing fields (absent or empty) are reported together; format checks
/// then run phone, email, voice and stop at the first failure.
pub fn validate_registration(
    request: &CreateUserRequest,
    voices: &[VoiceOption],
) -> AppResult<ValidRegistration> {
    let present = |value: &Option<String>| value.as_deref().filter(|v| !v.is_empty()).map(str::to_string);

    let phone_number = present(&request.phone_number);
    let email_address = present(&request.email_address);
    let selected_voice_id = present(&request.selected_voice_id);

    let missing: Vec<&str> = [
        ("phoneNumber", phone_number.is_none()),
        ("emailAddress", email_address.is_none()),
        ("selectedVoiceId", selected_voice_id.is_none()),
    ]
    .iter()
    .filter(|(_, is_missing)| *is_missing)
    .map(|(name, _)| *name)
    .collect();

    let (Some(phone_number), Some(email_address), Some(selected_voice_id)) =
        (phone_number, email_address, selected_voice_id)
    else {
        return Err(AppError::ValidationError(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    };

    if !is_valid_phone(&phone_number) {
        return Err(AppError::ValidationError(
            "Invalid phoneNumber format. Must be E.164 format (e.g., +12125551234)".to_string(),
        ));
    }

    if !is_valid_email(&email_address) {
        return Err(AppError::ValidationError("Invalid emailAddress format".to_string()));
    }

    if !is_valid_voice_id(&selected_voice_id, voices) {
        return Err(AppError::ValidationError(format!(
            "Invalid selectedVoiceId: {}",
            selected_voice_id
        )));
    }

    Ok(ValidRegistration {
        phone_number,
        email_address,
        selected_voice_id,
    })
}

/// Creates a user in the identity provider, then its profile row.
///
/// The two writes are not transactional. If the profile insert fails for
/// any reason other than an existing row, the identity account stays
/// behind and the caller gets an internal error; a retry then reports a
/// conflict.
pub struct RegistrationService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn ProfileStore>,
    voices: &'static [VoiceOption],
}

impl RegistrationService {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn ProfileStore>) -> Self {
        Self {
            identity,
            store,
            voices: VOICE_OPTIONS,
        }
    }

    pub fn with_voices(mut self, voices: &'static [VoiceOption]) -> Self {
        self.voices = voices;
        self
    }

    /// Register a new user and return the provider-assigned user id.
    pub async fn register(&self, request: &CreateUserRequest) -> AppResult<String> {
        let registration = validate_registration(request, self.voices)?;
        let email = registration.email_address.as_str();

        info!("Registering user for email: {}", email);

        match self.identity.find_user(email).await {
            Ok(Some(_)) => {
                warn!("Registration rejected, account exists for email: {}", email);
                return Err(AppError::ConflictError(
                    "User with this email address already exists".to_string(),
                ));
            }
            Ok(None) => {}
            Err(e) => {
                error!("Identity lookup failed for {}: {}", email, e);
                if e.is_internal() {
                    return Err(e);
                }
                return Err(AppError::InternalError(e.message().to_string()));
            }
        }

        let identity = NewIdentity {
            email: registration.email_address.clone(),
            phone_number: registration.phone_number.clone(),
        };
        let user_id = self.identity.create_user(&identity).await?;

        let now = Utc::now();
        let profile = UserProfile {
            user_id: user_id.clone(),
            phone_number: registration.phone_number,
            email_address: registration.email_address.clone(),
            selected_voice_id: registration.selected_voice_id,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.store.insert_profile(&profile).await {
            if !matches!(e, AppError::ConflictError(_)) {
                error!(
                    "Profile write failed after identity creation; orphaned identity account user_id={} email={}: {}",
                    user_id, profile.email_address, e
                );
            }
            return Err(e);
        }

        info!("User {} registered for email: {}", user_id, profile.email_address);
        Ok(user_id)
    }
}

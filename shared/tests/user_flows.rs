// End-to-end registration and profile flows against the in-memory services.
// Run with: cargo test -p metamatic-shared --test user_flows

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metamatic_shared::{
    AppError, AppResult, CreateUserRequest, IdentityProvider, IdentityUser, InMemoryIdentityProvider,
    InMemoryProfileStore, NewIdentity, ProfileService, ProfileStore, RegistrationService,
    UpdateVoiceRequest, UserProfile, VoiceOption, VOICE_OPTIONS,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn request(phone: &str, email: &str, voice: &str) -> CreateUserRequest {
    CreateUserRequest {
        phone_number: Some(phone.to_string()),
        email_address: Some(email.to_string()),
        selected_voice_id: Some(voice.to_string()),
    }
}

/// Counts calls that reach the identity provider, optionally hiding
/// existing accounts from lookups to mimic a lookup/create race.
struct ObservedIdentity {
    inner: InMemoryIdentityProvider,
    calls: AtomicUsize,
    stale_lookups: bool,
}

impl ObservedIdentity {
    fn new(stale_lookups: bool) -> Self {
        Self {
            inner: InMemoryIdentityProvider::new(),
            calls: AtomicUsize::new(0),
            stale_lookups,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for ObservedIdentity {
    async fn find_user(&self, username: &str) -> AppResult<Option<IdentityUser>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stale_lookups {
            return Ok(None);
        }
        self.inner.find_user(username).await
    }

    async fn create_user(&self, identity: &NewIdentity) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_user(identity).await
    }
}

/// Identity provider whose lookups always fail with a backend error.
struct BrokenIdentity;

#[async_trait]
impl IdentityProvider for BrokenIdentity {
    async fn find_user(&self, _username: &str) -> AppResult<Option<IdentityUser>> {
        Err(AppError::CognitoError("TooManyRequestsException".to_string()))
    }

    async fn create_user(&self, _identity: &NewIdentity) -> AppResult<String> {
        panic!("create_user must not be called after a failed lookup");
    }
}

/// Identity provider that hands out the same id for every account.
struct FixedIdIdentity;

#[async_trait]
impl IdentityProvider for FixedIdIdentity {
    async fn find_user(&self, _username: &str) -> AppResult<Option<IdentityUser>> {
        Ok(None)
    }

    async fn create_user(&self, _identity: &NewIdentity) -> AppResult<String> {
        Ok("fixed-user-id".to_string())
    }
}

/// Store whose inserts fail with a backend error and count calls.
#[derive(Default)]
struct FailingStore {
    calls: AtomicUsize,
}

#[async_trait]
impl ProfileStore for FailingStore {
    async fn insert_profile(&self, _profile: &UserProfile) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::DynamoDBError("ProvisionedThroughputExceededException".to_string()))
    }

    async fn get_profile(&self, _user_id: &str) -> AppResult<Option<UserProfile>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }

    async fn update_voice(
        &self,
        user_id: &str,
        _voice_id: &str,
        _updated_at: DateTime<Utc>,
    ) -> AppResult<UserProfile> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::NotFoundError(format!("User not found: {}", user_id)))
    }
}

#[tokio::test]
async fn test_register_then_read_then_update_voice() {
    let store = Arc::new(InMemoryProfileStore::new());
    let registration = RegistrationService::new(Arc::new(InMemoryIdentityProvider::new()), store.clone());
    let profiles = ProfileService::new(store.clone());

    let user_id = registration
        .register(&request("+12125551234", "a@b.com", "data-driven"))
        .await
        .unwrap();
    assert!(!user_id.is_empty());

    let profile = profiles.get_profile(&user_id).await.unwrap();
    assert_eq!(profile.user_id, user_id);
    assert_eq!(profile.phone_number, "+12125551234");
    assert_eq!(profile.email_address, "a@b.com");
    assert_eq!(profile.selected_voice_id, "data-driven");
    assert_eq!(profile.created_at, profile.updated_at);

    let update = UpdateVoiceRequest {
        selected_voice_id: Some("funny-witty".to_string()),
    };
    let updated = profiles.update_voice(&user_id, &update).await.unwrap();

    assert_eq!(updated.selected_voice_id, "funny-witty");
    assert!(updated.updated_at >= profile.updated_at);
    assert_eq!(updated.user_id, profile.user_id);
    assert_eq!(updated.phone_number, profile.phone_number);
    assert_eq!(updated.email_address, profile.email_address);
    assert_eq!(updated.created_at, profile.created_at);

    assert_eq!(profiles.get_profile(&user_id).await.unwrap(), updated);
}

#[tokio::test]
async fn test_register_twice_conflicts() {
    let identity = Arc::new(InMemoryIdentityProvider::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let registration = RegistrationService::new(identity.clone(), store.clone());

    registration
        .register(&request("+12125551234", "a@b.com", "data-driven"))
        .await
        .unwrap();

    let err = registration
        .register(&request("+13105550000", "a@b.com", "funny-witty"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ConflictError(_)));
    assert_eq!(identity.count(), 1);
    assert_eq!(store.count(), 1);
}

#[tokio::test]
async fn test_invalid_input_makes_no_external_call() {
    let identity = Arc::new(ObservedIdentity::new(false));
    let store = Arc::new(FailingStore::default());
    let registration = RegistrationService::new(identity.clone(), store.clone());

    let err = registration
        .register(&request("not-a-phone", "a@b.com", "data-driven"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("phoneNumber")));
    assert_eq!(identity.calls(), 0);
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_create_race_maps_to_conflict() {
    // Lookups never see existing accounts, so the duplicate is caught at creation.
    let identity = Arc::new(ObservedIdentity::new(true));
    let store = Arc::new(InMemoryProfileStore::new());
    let registration = RegistrationService::new(identity.clone(), store.clone());

    registration
        .register(&request("+12125551234", "a@b.com", "data-driven"))
        .await
        .unwrap();
    let err = registration
        .register(&request("+12125551234", "a@b.com", "data-driven"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ConflictError(_)));
    assert_eq!(store.count(), 1);
}

#[tokio::test]
async fn test_existing_row_maps_to_conflict() {
    let store = Arc::new(InMemoryProfileStore::new());
    let registration = RegistrationService::new(Arc::new(FixedIdIdentity), store.clone());

    registration
        .register(&request("+12125551234", "a@b.com", "data-driven"))
        .await
        .unwrap();
    let err = registration
        .register(&request("+12125551234", "c@d.com", "data-driven"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ConflictError(_)));
    assert_eq!(store.count(), 1);
}

#[tokio::test]
async fn test_lookup_failure_is_internal() {
    let store = Arc::new(InMemoryProfileStore::new());
    let registration = RegistrationService::new(Arc::new(BrokenIdentity), store.clone());

    let err = registration
        .register(&request("+12125551234", "a@b.com", "data-driven"))
        .await
        .unwrap_err();

    assert!(err.is_internal());
    assert_eq!(store.count(), 0);
}

#[tokio::test]
async fn test_store_failure_leaves_orphaned_identity() {
    let identity = Arc::new(InMemoryIdentityProvider::new());
    let registration = RegistrationService::new(identity.clone(), Arc::new(FailingStore::default()));

    let err = registration
        .register(&request("+12125551234", "a@b.com", "data-driven"))
        .await
        .unwrap_err();
    assert!(err.is_internal());
    assert!(identity.get("a@b.com").is_some());

    // A retry finds the orphaned account and stops at a conflict.
    let err = registration
        .register(&request("+12125551234", "a@b.com", "data-driven"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ConflictError(_)));
    assert_eq!(identity.count(), 1);
}

#[tokio::test]
async fn test_concurrent_registrations_single_winner() {
    let identity = Arc::new(ObservedIdentity::new(true));
    let store = Arc::new(InMemoryProfileStore::new());
    let registration = Arc::new(RegistrationService::new(identity.clone(), store.clone()));

    let mut handles = Vec::new();
    for i in 0..8 {
        let registration = registration.clone();
        handles.push(tokio::spawn(async move {
            let phone = format!("+1212555{:04}", i);
            registration
                .register(&request(&phone, "same@example.com", "data-driven"))
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AppError::ConflictError(_)) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(store.count(), 1);
}

#[tokio::test]
async fn test_update_unknown_user_writes_nothing() {
    let store = Arc::new(InMemoryProfileStore::new());
    let profiles = ProfileService::new(store.clone());

    let err = profiles
        .update_voice(
            "missing-user",
            &UpdateVoiceRequest {
                selected_voice_id: Some("funny-witty".to_string()),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFoundError(_)));
    assert_eq!(store.count(), 0);
    assert!(store.get_profile("missing-user").await.unwrap().is_none());
}

/// Catalog with every voice except `data-driven` retired.
const REDUCED_VOICES: &[VoiceOption] = &[VoiceOption {
    id: "data-driven",
    label: "Data-driven",
    description: "Focuses on metrics, performance data, and workout statistics",
}];

#[tokio::test]
async fn test_retired_voice_stays_on_existing_profiles() {
    let identity = Arc::new(InMemoryIdentityProvider::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let registration =
        RegistrationService::new(identity.clone(), store.clone()).with_voices(VOICE_OPTIONS);
    let user_id = registration
        .register(&request("+12125551234", "a@b.com", "christopher-walken"))
        .await
        .unwrap();

    let profiles = ProfileService::new(store.clone()).with_voices(REDUCED_VOICES);

    // Reads never re-check the stored id against the catalog.
    let profile = profiles.get_profile(&user_id).await.unwrap();
    assert_eq!(profile.selected_voice_id, "christopher-walken");

    // Updates do, so only voices still in the catalog are accepted.
    let err = profiles
        .update_voice(
            &user_id,
            &UpdateVoiceRequest {
                selected_voice_id: Some("funny-witty".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(
        profiles.get_profile(&user_id).await.unwrap().selected_voice_id,
        "christopher-walken"
    );

    let reduced = RegistrationService::new(identity, store).with_voices(REDUCED_VOICES);
    let err = reduced
        .register(&request("+12125550000", "c@d.com", "christopher-walken"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("christopher-walken")));
}

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Timestamps are written the way JavaScript's `toISOString` writes them,
/// both in the table and in API responses.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_timestamp<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(timestamp))
}

/// One row of the users table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub phone_number: String,
    pub email_address: String,
    pub selected_voice_id: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /user`. Fields stay optional so missing ones can be
/// reported by name instead of as a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub phone_number: Option<String>,
    pub email_address: Option<String>,
    pub selected_voice_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVoiceRequest {
    pub selected_voice_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub success: bool,
    pub user_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVoiceResponse {
    pub success: bool,
    pub user: UserProfile,
    pub message: String,
}

/// An account as seen by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityUser {
    pub username: String,
    /// Provider-assigned opaque id (`sub`), absent on malformed records.
    pub user_id: Option<String>,
}

/// Account creation request for the identity provider. The username is
/// the email address.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIdentity {
    pub email: String,
    pub phone_number: String,
}

impl NewIdentity {
    pub fn username(&self) -> &str {
        &self.email
    }

    /// Attributes sent on creation. Both contact points are marked verified
    /// since no verification message is ever sent.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("phone_number", self.phone_number.clone()),
            ("phone_number_verified", "true".to_string()),
            ("email", self.email.clone()),
            ("email_verified", "true".to_string()),
        ]
    }
}

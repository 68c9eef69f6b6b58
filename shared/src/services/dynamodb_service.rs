use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::Debug;

use crate::{format_timestamp, AppError, AppResult, ProfileStore, UserProfile};

pub struct DynamoDBService {
    client: DynamoClient,
    users_table: String,
}

impl DynamoDBService {
    pub fn new(client: DynamoClient, users_table: String) -> Self {
        Self {
            client,
            users_table,
        }
    }
}

fn profile_to_item(profile: &UserProfile) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert("userId".to_string(), AttributeValue::S(profile.user_id.clone()));
    item.insert("phoneNumber".to_string(), AttributeValue::S(profile.phone_number.clone()));
    item.insert("emailAddress".to_string(), AttributeValue::S(profile.email_address.clone()));
    item.insert("selectedVoiceId".to_string(), AttributeValue::S(profile.selected_voice_id.clone()));
    item.insert("createdAt".to_string(), AttributeValue::S(format_timestamp(&profile.created_at)));
    item.insert("updatedAt".to_string(), AttributeValue::S(format_timestamp(&profile.updated_at)));
    item
}

fn parse_profile_from_item(item: &HashMap<String, AttributeValue>) -> AppResult<UserProfile> {
    let string_attr = |name: &str| -> AppResult<String> {
        item.get(name)
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| AppError::InternalError(format!("Missing {}", name)))
    };

    let timestamp_attr = |name: &str| -> AppResult<DateTime<Utc>> {
        item.get(name)
            .and_then(|v| v.as_s().ok())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| AppError::InternalError(format!("Missing {}", name)))
    };

    Ok(UserProfile {
        user_id: string_attr("userId")?,
        phone_number: string_attr("phoneNumber")?,
        email_address: string_attr("emailAddress")?,
        selected_voice_id: string_attr("selectedVoiceId")?,
        created_at: timestamp_attr("createdAt")?,
        updated_at: timestamp_attr("updatedAt")?,
    })
}

/// A failed `attribute_not_exists` condition means the row is already there.
fn classify_put_error<R: Debug + 'static>(
    err: &SdkError<PutItemError, R>,
    user_id: &str,
) -> AppError {
    let exists = err
        .as_service_error()
        .map(|e| e.is_conditional_check_failed_exception())
        .unwrap_or(false);
    if exists {
        tracing::warn!("Profile row for {} already exists", user_id);
        AppError::ConflictError("User already exists".to_string())
    } else {
        AppError::DynamoDBError(format!("Failed to save user: {}", DisplayErrorContext(err)))
    }
}

/// A failed `attribute_exists` condition means there is no row to update.
fn classify_update_error<R: Debug + 'static>(
    err: &SdkError<UpdateItemError, R>,
    user_id: &str,
) -> AppError {
    let missing = err
        .as_service_error()
        .map(|e| e.is_conditional_check_failed_exception())
        .unwrap_or(false);
    if missing {
        AppError::NotFoundError(format!("User not found: {}", user_id))
    } else {
        AppError::DynamoDBError(format!("Failed to update voice: {}", DisplayErrorContext(err)))
    }
}

#[async_trait]
impl ProfileStore for DynamoDBService {
    async fn insert_profile(&self, profile: &UserProfile) -> AppResult<()> {
        self.client
            .put_item()
            .table_name(&self.users_table)
            .set_item(Some(profile_to_item(profile)))
            .condition_expression("attribute_not_exists(userId)")
            .send()
            .await
            .map_err(|err| classify_put_error(&err, &profile.user_id))?;

        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> AppResult<Option<UserProfile>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.users_table)
            .key("userId", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(|e| AppError::DynamoDBError(DisplayErrorContext(&e).to_string()))?;

        match result.item {
            Some(item) => parse_profile_from_item(&item).map(Some),
            None => Ok(None),
        }
    }

    async fn update_voice(
        &self,
        user_id: &str,
        voice_id: &str,
        updated_at: DateTime<Utc>,
    ) -> AppResult<UserProfile> {
        let result = self
            .client
            .update_item()
            .table_name(&self.users_table)
            .key("userId", AttributeValue::S(user_id.to_string()))
            .update_expression("SET selectedVoiceId = :voiceId, updatedAt = :now")
            .expression_attribute_values(":voiceId", AttributeValue::S(voice_id.to_string()))
            .expression_attribute_values(":now", AttributeValue::S(format_timestamp(&updated_at)))
            .condition_expression("attribute_exists(userId)")
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|err| classify_update_error(&err, user_id))?;

        let attributes = result.attributes.ok_or_else(|| {
            AppError::InternalError("Update returned no attributes".to_string())
        })?;

        parse_profile_from_item(&attributes)
    }
}

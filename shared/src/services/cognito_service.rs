use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::error::{DisplayErrorContext, SdkError};
use aws_sdk_cognitoidentityprovider::operation::admin_create_user::AdminCreateUserError;
use aws_sdk_cognitoidentityprovider::operation::admin_get_user::AdminGetUserError;
use aws_sdk_cognitoidentityprovider::types::{AttributeType, MessageActionType};
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use std::fmt::Debug;

use crate::{AppError, AppResult, IdentityProvider, IdentityUser, NewIdentity};

const SUB_ATTRIBUTE: &str = "sub";

pub struct CognitoService {
    client: CognitoClient,
    user_pool_id: String,
}

impl CognitoService {
    pub fn new(client: CognitoClient, user_pool_id: String) -> Self {
        Self {
            client,
            user_pool_id,
        }
    }

    fn find_sub(attributes: &[AttributeType]) -> Option<String> {
        attributes
            .iter()
            .find(|attr| attr.name() == SUB_ATTRIBUTE)
            .and_then(|attr| attr.value())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

/// `UserNotFoundException` on lookup is an answer, not a failure.
fn lookup_error_outcome<R: Debug + 'static>(
    err: &SdkError<AdminGetUserError, R>,
    username: &str,
) -> AppResult<Option<IdentityUser>> {
    let not_found = err
        .as_service_error()
        .map(|e| e.is_user_not_found_exception())
        .unwrap_or(false);
    if not_found {
        return Ok(None);
    }

    tracing::error!(
        "Cognito lookup failed for {}: {}",
        username,
        DisplayErrorContext(err)
    );
    Err(AppError::CognitoError(format!(
        "Failed to look up user: {}",
        DisplayErrorContext(err)
    )))
}

fn classify_create_error<R: Debug + 'static>(
    err: &SdkError<AdminCreateUserError, R>,
    email: &str,
) -> AppError {
    let exists = err
        .as_service_error()
        .map(|e| e.is_username_exists_exception())
        .unwrap_or(false);
    if exists {
        tracing::warn!("Cognito reports {} already exists", email);
        AppError::ConflictError("User with this email address already exists".to_string())
    } else {
        AppError::CognitoError(format!("Failed to create user: {}", DisplayErrorContext(err)))
    }
}

#[async_trait]
impl IdentityProvider for CognitoService {
    async fn find_user(&self, username: &str) -> AppResult<Option<IdentityUser>> {
        let result = self
            .client
            .admin_get_user()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .send()
            .await;

        match result {
            Ok(output) => Ok(Some(IdentityUser {
                username: output.username().to_string(),
                user_id: Self::find_sub(output.user_attributes()),
            })),
            Err(err) => lookup_error_outcome(&err, username),
        }
    }

    async fn create_user(&self, identity: &NewIdentity) -> AppResult<String> {
        let attributes = identity
            .attributes()
            .into_iter()
            .map(|(name, value)| {
                AttributeType::builder()
                    .name(name)
                    .value(value)
                    .build()
                    .map_err(|e| AppError::InternalError(format!("Failed to build attribute: {}", e)))
            })
            .collect::<AppResult<Vec<_>>>()?;

        let output = self
            .client
            .admin_create_user()
            .user_pool_id(&self.user_pool_id)
            .username(identity.username())
            .set_user_attributes(Some(attributes))
            .message_action(MessageActionType::Suppress)
            .send()
            .await
            .map_err(|err| classify_create_error(&err, &identity.email))?;

        let user_id = output
            .user()
            .and_then(|user| Self::find_sub(user.attributes()))
            .ok_or_else(|| {
                AppError::InternalError("Cognito did not return a sub for the new user".to_string())
            })?;

        tracing::info!("Created Cognito user {} for {}", user_id, identity.email);
        Ok(user_id)
    }
}

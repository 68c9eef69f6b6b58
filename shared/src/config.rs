use crate::AppError;

pub const DEFAULT_APP_NAME: &str = "metamatic-api";
pub const DEFAULT_STAGE: &str = "dev";
pub const DEFAULT_COGNITO_REGION: &str = "us-west-2";

/// Configuration resolved once at cold start and handed to the services.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub app_name: String,
    pub stage: String,
    pub users_table: String,
    pub cognito_region: String,
    pub user_pool_id: Option<String>,
}

impl AppConfig {
    /// Create config from the Lambda environment variables set by the stack
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let app_name = get("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string());
        let stage = get("STAGE").unwrap_or_else(|| DEFAULT_STAGE.to_string());
        let cognito_region =
            get("COGNITO_REGION").unwrap_or_else(|| DEFAULT_COGNITO_REGION.to_string());
        let user_pool_id = get("COGNITO_USER_POOL_ID");

        let users_table = match get("USERS_TABLE") {
            Some(table) => table,
            None => {
                let derived = resource_name(&app_name, &stage, "users");
                tracing::warn!("USERS_TABLE not set, using derived table name: {}", derived);
                derived
            }
        };

        Self {
            app_name,
            stage,
            users_table,
            cognito_region,
            user_pool_id,
        }
    }

    /// Pool id for handlers that talk to Cognito
    pub fn require_user_pool_id(&self) -> Result<&str, AppError> {
        self.user_pool_id.as_deref().ok_or_else(|| {
            AppError::ConfigurationError("COGNITO_USER_POOL_ID is not configured".to_string())
        })
    }
}

/// Resource names follow the {APP_NAME}-{STAGE}-{RESOURCE_NAME} pattern
fn resource_name(app_name: &str, stage: &str, resource: &str) -> String {
    format!("{}-{}-{}", app_name, stage, resource)
}

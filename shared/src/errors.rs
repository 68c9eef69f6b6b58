use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    ConflictError(String),

    #[error("Not found: {0}")]
    NotFoundError(String),

    #[error("DynamoDB error: {0}")]
    DynamoDBError(String),

    #[error("Cognito error: {0}")]
    CognitoError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    /// HTTP status the API reports for this error. Conflicts share 400 with
    /// validation failures.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::ValidationError(_) | AppError::ConflictError(_) => 400,
            AppError::NotFoundError(_) => 404,
            _ => 500,
        }
    }

    /// Errors that signal a broken backend rather than a bad request.
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }

    /// Message shown to API clients, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            AppError::ValidationError(msg)
            | AppError::ConflictError(msg)
            | AppError::NotFoundError(msg)
            | AppError::DynamoDBError(msg)
            | AppError::CognitoError(msg)
            | AppError::ConfigurationError(msg)
            | AppError::InternalError(msg) => msg,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

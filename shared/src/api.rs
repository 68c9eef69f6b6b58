//! API Gateway proxy adaptation shared by every Lambda.

use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use aws_lambda_events::encodings::Body;
use http::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::{AppError, AppResult};

/// The parts of a proxy request the handlers dispatch on.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: HashMap::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Path below `prefix`, without the joining slash or trailing slashes.
    pub fn subpath(&self, prefix: &str) -> &str {
        let rest = self.path.strip_prefix(prefix).unwrap_or(&self.path);
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        rest.trim_end_matches('/')
    }

    /// Parse the JSON body. A missing or blank body parses as `{}`.
    pub fn json_body<T: DeserializeOwned>(&self) -> AppResult<T> {
        let raw = match self.body.as_deref() {
            Some(body) if !body.trim().is_empty() => body,
            _ => "{}",
        };

        serde_json::from_str(raw).map_err(|e| {
            tracing::warn!("Rejecting malformed request body: {}", e);
            AppError::ValidationError("Invalid JSON body".to_string())
        })
    }
}

impl From<ApiGatewayProxyRequest> for ApiRequest {
    fn from(event: ApiGatewayProxyRequest) -> Self {
        let query = event
            .query_string_parameters
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        Self {
            method: event.http_method,
            path: event.path.unwrap_or_default(),
            query,
            body: event.body,
        }
    }
}

/// A JSON response with the permissive CORS headers every route sends.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status_code: u16, body: Value) -> Self {
        Self { status_code, body }
    }

    pub fn ok<T: Serialize>(body: T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => Self::new(200, value),
            Err(e) => Self::internal_error(&format!("Failed to serialize response: {}", e)),
        }
    }

    pub fn message(message: &str) -> Self {
        Self::new(200, json!({ "message": message }))
    }

    pub fn bad_request(error: &str) -> Self {
        Self::new(400, json!({ "error": error }))
    }

    pub fn not_found() -> Self {
        Self::new(404, json!({ "error": "Not Found" }))
    }

    pub fn not_found_with_message(message: &str) -> Self {
        Self::new(404, json!({ "error": "Not Found", "message": message }))
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new(500, json!({ "error": "Internal Server Error", "message": message }))
    }

    pub fn from_error(err: &AppError) -> Self {
        match err.status_code() {
            400 => Self::bad_request(err.message()),
            404 => Self::not_found_with_message(err.message()),
            _ => {
                tracing::error!("Request failed: {}", err);
                Self::internal_error(err.message())
            }
        }
    }

    pub fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

impl From<AppResult<ApiResponse>> for ApiResponse {
    fn from(result: AppResult<ApiResponse>) -> Self {
        result.unwrap_or_else(|e| ApiResponse::from_error(&e))
    }
}

impl From<ApiResponse> for ApiGatewayProxyResponse {
    fn from(response: ApiResponse) -> Self {
        ApiGatewayProxyResponse {
            status_code: i64::from(response.status_code),
            headers: ApiResponse::headers(),
            body: Some(Body::Text(response.body.to_string())),
            ..Default::default()
        }
    }
}

use aws_config::BehaviorVersion;
use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use http::Method;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use std::sync::Arc;
use tracing::info;

use metamatic_shared::{
    AppConfig, AppError, AppResult, ApiRequest, ApiResponse, CognitoService, CreateUserRequest,
    CreateUserResponse, DynamoDBService, IdentityProvider, ProfileService, ProfileStore,
    RegistrationService, UpdateVoiceRequest, UpdateVoiceResponse,
};

struct UserApi {
    registration: RegistrationService,
    profiles: ProfileService,
}

impl UserApi {
    fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn ProfileStore>) -> Self {
        Self {
            registration: RegistrationService::new(identity, store.clone()),
            profiles: ProfileService::new(store),
        }
    }
}

async fn function_handler(
    api: &UserApi,
    event: LambdaEvent<ApiGatewayProxyRequest>,
) -> Result<ApiGatewayProxyResponse, Error> {
    let request = ApiRequest::from(event.payload);
    info!("{} {}", request.method, request.path);

    let response = route(api, &request).await;
    info!("Responding with status {}", response.status_code);
    Ok(response.into())
}

async fn route(api: &UserApi, request: &ApiRequest) -> ApiResponse {
    let subpath = request.subpath("/user");
    let method = &request.method;

    let result = if *method == Method::POST && subpath.is_empty() {
        create_user(api, request).await
    } else if *method == Method::GET && (subpath == "profile" || subpath.starts_with("profile/")) {
        get_profile(api, subpath).await
    } else if *method == Method::PUT && subpath == "settings" {
        Ok(ApiResponse::message("update settings stub"))
    } else if *method == Method::PUT && subpath.contains("/voice") {
        update_voice(api, request, subpath).await
    } else {
        Ok(ApiResponse::not_found())
    };

    result.into()
}

/// Percent-decode a user id taken from the path.
fn decode_user_id(raw: &str, expected: &str) -> AppResult<String> {
    if raw.is_empty() {
        return Err(AppError::ValidationError(format!(
            "Missing user_id in path. Expected {}",
            expected
        )));
    }

    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| AppError::ValidationError("user_id is not valid UTF-8".to_string()))
}

// POST /user
async fn create_user(api: &UserApi, request: &ApiRequest) -> AppResult<ApiResponse> {
    let body: CreateUserRequest = request.json_body()?;
    let user_id = api.registration.register(&body).await?;

    Ok(ApiResponse::ok(CreateUserResponse {
        success: true,
        user_id,
        message: "User created successfully".to_string(),
    }))
}

// GET /user/profile/{user_id}
async fn get_profile(api: &UserApi, subpath: &str) -> AppResult<ApiResponse> {
    let raw = subpath.split('/').nth(1).unwrap_or_default();
    let user_id = decode_user_id(raw, "/user/profile/{user_id}")?;

    let profile = api.profiles.get_profile(&user_id).await?;
    Ok(ApiResponse::ok(profile))
}

// PUT /user/{user_id}/voice
async fn update_voice(api: &UserApi, request: &ApiRequest, subpath: &str) -> AppResult<ApiResponse> {
    let raw = subpath.split('/').next().unwrap_or_default();
    let user_id = decode_user_id(raw, "/user/{user_id}/voice")?;

    let body: UpdateVoiceRequest = request.json_body()?;
    let user = api.profiles.update_voice(&user_id, &body).await?;

    Ok(ApiResponse::ok(UpdateVoiceResponse {
        success: true,
        user,
        message: "Voice preference updated successfully".to_string(),
    }))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = AppConfig::from_env();
    let user_pool_id = config.require_user_pool_id()?.to_string();
    info!(
        "Starting user-api - stage: {}, table: {}, cognito region: {}",
        config.stage, config.users_table, config.cognito_region
    );

    // Clients are built once per cold start
    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&sdk_config);
    let cognito_config = aws_sdk_cognitoidentityprovider::config::Builder::from(&sdk_config)
        .region(aws_sdk_cognitoidentityprovider::config::Region::new(
            config.cognito_region.clone(),
        ))
        .build();
    let cognito_client = aws_sdk_cognitoidentityprovider::Client::from_conf(cognito_config);

    let api = UserApi::new(
        Arc::new(CognitoService::new(cognito_client, user_pool_id)),
        Arc::new(DynamoDBService::new(dynamodb_client, config.users_table.clone())),
    );

    run(service_fn(|event| function_handler(&api, event))).await
}

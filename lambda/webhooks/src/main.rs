use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use http::Method;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::json;
use tracing::{info, warn};

use metamatic_shared::{ApiRequest, ApiResponse};

const CHALLENGE_PARAM: &str = "hub.challenge";

async fn function_handler(
    event: LambdaEvent<ApiGatewayProxyRequest>,
) -> Result<ApiGatewayProxyResponse, Error> {
    let request = ApiRequest::from(event.payload);
    info!("{} {}", request.method, request.path);

    Ok(route(&request).into())
}

fn route(request: &ApiRequest) -> ApiResponse {
    if request.subpath("/webhooks") != "strava" {
        return ApiResponse::not_found();
    }

    if request.method == Method::GET {
        verify_subscription(request)
    } else if request.method == Method::POST {
        receive_event(request)
    } else {
        ApiResponse::not_found()
    }
}

/// Strava's subscription handshake: echo `hub.challenge` back verbatim.
fn verify_subscription(request: &ApiRequest) -> ApiResponse {
    match request.query_param(CHALLENGE_PARAM) {
        Some(challenge) if !challenge.is_empty() => {
            info!("Answering Strava subscription challenge");
            ApiResponse::new(200, json!({ "hub.challenge": challenge }))
        }
        _ => {
            warn!("Webhook verification request without {}", CHALLENGE_PARAM);
            ApiResponse::bad_request("Missing hub.challenge")
        }
    }
}

// TODO: verify the event signature and forward activity events to the title agent.
fn receive_event(request: &ApiRequest) -> ApiResponse {
    let size = request.body.as_deref().map(str::len).unwrap_or(0);
    info!("Received Strava webhook event ({} bytes)", size);
    ApiResponse::message("webhook received")
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    run(service_fn(function_handler)).await
}

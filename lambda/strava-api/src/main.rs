use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use http::Method;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::info;

use metamatic_shared::{ApiRequest, ApiResponse};

async fn function_handler(
    event: LambdaEvent<ApiGatewayProxyRequest>,
) -> Result<ApiGatewayProxyResponse, Error> {
    let request = ApiRequest::from(event.payload);
    info!("{} {}", request.method, request.path);

    Ok(route(&request).into())
}

fn route(request: &ApiRequest) -> ApiResponse {
    let subpath = request.subpath("/strava");

    if request.method == Method::GET && subpath == "oauth/url" {
        ApiResponse::message("strava oauth url stub")
    } else if request.method == Method::POST && subpath == "oauth/callback" {
        ApiResponse::message("strava oauth callback stub")
    } else {
        ApiResponse::not_found()
    }
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

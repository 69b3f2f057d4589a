// SPDX-License-Identifier: GPL-3.0-or-later
pub mod error;
pub mod handlers;

use std::any::Any;

use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use error::{ApiError, ErrorResponse};
use handlers::process::{process, ProcessResponse, TrackResponse, __path_process};
use handlers::system::{health, root, HealthResponse, StatusResponse, __path_health, __path_root};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracklister_application::AppState;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(root, health, process),
    components(
        schemas(
            StatusResponse,
            HealthResponse,
            ProcessResponse,
            TrackResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "tracklist", description = "Tracklist extraction endpoints")
    ),
    info(
        title = "Tracklister API",
        version = "0.1.0",
        description = "Extracts tracklists from music video and track URLs",
    )
)]
struct ApiDoc;

pub fn router(state: AppState) -> Router {
    info!(target: "api", "building router");

    let openapi = ApiDoc::openapi();
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/process", get(process))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", openapi))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(target: "api", panic = message, "request handler panicked");
    ApiError::internal().into_response()
}

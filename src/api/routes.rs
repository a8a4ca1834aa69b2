//! Router configuration for the API.

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, StatusCode, header},
    middleware,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{
    REQUEST_ID_HEADER, global_error_handler, logging_middleware, request_id_middleware,
};
use crate::config::ServerConfig;
use crate::state::AppState;

/// Every documented route, before state and middleware are attached.
pub fn api_router() -> OpenApiRouter<AppState> {
    OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(handlers::users::user_routes())
        .merge(handlers::posts::post_routes())
        .merge(handlers::health::health_routes())
}

/// Creates the application router with all routes and middleware.
///
/// # Middleware Order
/// Last added runs first:
/// 1. Request ID - generates/propagates `x-request-id`
/// 2. Logging - logs each request inside a span carrying the request id
/// 3. CORS and response compression
/// 4. Global error handler - turns plain error responses into JSON envelopes
/// 5. Timeout - answers 408 after `server.request_timeout` seconds
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let (router, openapi) = api_router().split_for_parts();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
        .expose_headers([header::LOCATION, HeaderName::from_static(REQUEST_ID_HEADER)]);

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout),
        ))
        .layer(middleware::from_fn(global_error_handler))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

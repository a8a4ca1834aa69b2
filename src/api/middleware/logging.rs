//! Logging middleware for request/response tracing.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{Instrument, info, info_span};

use super::RequestId;

/// Logs method, path and request id on the way in, then status and
/// duration on the way out. Everything the handler logs runs inside the
/// same `http_request` span.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let span = info_span!(
        "http_request",
        method = %method,
        path = %path,
        request_id = %request_id
    );

    async move {
        info!("Request received");

        let start = Instant::now();
        let response = next.run(request).await;

        info!(
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Response sent"
        );
        response
    }
    .instrument(span)
    .await
}

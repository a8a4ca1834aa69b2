//! Request correlation ids.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id stored in the request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    fn from_request(request: &Request) -> Self {
        let id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Self(id)
    }
}

/// Reuses the caller's `x-request-id` header or generates a UUID v4, stores
/// it in the request extensions and echoes it on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_request(&request);
    let header_value = HeaderValue::from_str(&request_id.0).ok();
    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;
    if let Some(value) = header_value {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

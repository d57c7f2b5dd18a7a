//! HTTP middleware for request tracking.

use crate::core::logging::{generate_request_id, REQUEST_ID};
use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Assign a request ID, scope it for the handler, and echo it on the response.
///
/// An inbound `x-request-id` is reused and stays on the request, so the
/// backend sees the same ID as the router's logs.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(generate_request_id);

    let mut response = REQUEST_ID.scope(request_id.clone(), next.run(request)).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

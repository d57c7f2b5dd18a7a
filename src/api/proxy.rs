//! Transparent streaming proxy to a backend endpoint.
//!
//! The outbound request reuses the inbound method, path and headers with the
//! buffered body. The backend's status, headers and body are relayed back;
//! the body is streamed chunk by chunk, never collected.
//!
//! Cancellation follows ownership: if the client disconnects, hyper drops
//! the handler future (aborting an in-flight send) or the response body
//! (dropping the backend stream and its connection).

use crate::api::disconnect::DisconnectStream;
use crate::core::{get_request_id, AppError, Result};
use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::Response,
};
use bytes::Bytes;

/// Connection-scoped headers that must not be relayed by a proxy.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|h| name.eq_ignore_ascii_case(h))
}

/// Inbound request parts needed to build the outbound call.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Build the backend URL: endpoint base concatenated with the inbound path.
pub fn target_url(endpoint: &str, path: &str) -> String {
    format!("{}{}", endpoint, path)
}

/// Copy inbound headers for the backend, keeping order and repeated values.
///
/// `host` is dropped so the client sets the backend's authority.
pub fn outbound_headers(inbound: &HeaderMap) -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound.iter() {
        let name = name.as_str();
        if name == "host" || is_hop_by_hop(name) {
            continue;
        }
        let (Ok(name), Ok(value)) = (
            reqwest::header::HeaderName::from_bytes(name.as_bytes()),
            reqwest::header::HeaderValue::from_bytes(value.as_bytes()),
        ) else {
            continue;
        };
        headers.append(name, value);
    }
    headers
}

/// Copy backend response headers for the client, keeping order and repeated values.
pub fn inbound_headers(backend: &reqwest::header::HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(backend.len());
    for (name, value) in backend.iter() {
        let name = name.as_str();
        if is_hop_by_hop(name) {
            continue;
        }
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) else {
            continue;
        };
        headers.append(name, value);
    }
    headers
}

/// Relay `request` to `endpoint` and stream the backend's answer back.
pub async fn forward(
    client: &reqwest::Client,
    endpoint: &str,
    request: ForwardRequest,
) -> Result<Response> {
    let url = target_url(endpoint, &request.path);
    let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let outbound = client
        .request(method, &url)
        .headers(outbound_headers(&request.headers))
        .body(request.body)
        .build()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let backend = client.execute(outbound).await.map_err(|e| {
        tracing::warn!(
            request_id = %get_request_id(),
            endpoint = %endpoint,
            url = %url,
            error = %e,
            is_timeout = e.is_timeout(),
            is_connect = e.is_connect(),
            "Backend request failed"
        );
        AppError::BackendUnreachable(e)
    })?;

    let status = StatusCode::from_u16(backend.status().as_u16())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::debug!(
        request_id = %get_request_id(),
        endpoint = %endpoint,
        status = %status,
        "Backend responded"
    );

    let headers = inbound_headers(backend.headers());
    let body = Body::from_stream(DisconnectStream::new(
        Box::pin(backend.bytes_stream()),
        endpoint,
    ));

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

//! HTTP request handlers for the model router.
//!
//! - `POST /v1/chat/completions`: routed and proxied to a backend
//! - `GET /v1/models`: merged model listing from every backend
//! - `GET /health`: liveness, no backend dependency

use crate::api::models::RoutingFields;
use crate::api::proxy::{forward, ForwardRequest};
use crate::core::config::RouterConfig;
use crate::core::{get_request_id, request_id_middleware, Result};
use crate::services::model_aggregator::aggregate_models;
use crate::services::RoutingService;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, Uri},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub routing: RoutingService,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(routing: RoutingService, http_client: reqwest::Client) -> Self {
        Self {
            routing,
            http_client,
        }
    }

    /// Build the routing service and a pooled HTTP client from configuration.
    pub fn from_config(config: &RouterConfig) -> reqwest::Result<Self> {
        Ok(Self::new(
            RoutingService::from_config(config),
            create_http_client(config)?,
        ))
    }
}

/// Create the shared backend client.
///
/// Timeouts are only applied when configured; by default a backend call may
/// run as long as the client stays connected.
pub fn create_http_client(config: &RouterConfig) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .danger_accept_invalid_certs(!config.verify_ssl)
        .pool_max_idle_per_host(100)
        .pool_idle_timeout(std::time::Duration::from_secs(90))
        .tcp_keepalive(std::time::Duration::from_secs(60));

    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    if let Some(timeout) = config.connect_timeout() {
        builder = builder.connect_timeout(timeout);
    }

    builder.build()
}

/// Build the router with all endpoints and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/v1/chat/completions",
            // Bodies are buffered for classification; backends decide on size
            post(chat_completions).layer(DefaultBodyLimit::disable()),
        )
        .route("/v1/models", get(list_models))
        .route("/health", get(health))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Route a chat completion to its backend and relay the response.
///
/// The body is buffered once: classification reads the buffer and the same
/// bytes are sent to the backend unchanged.
#[tracing::instrument(skip_all, fields(request_id = %get_request_id()))]
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let fields = RoutingFields::classify(&body);
    let decision = state.routing.route(&fields.user, &fields.model).map_err(|e| {
        tracing::info!(model = %fields.model, "No pool for model");
        e
    })?;

    tracing::info!(
        model = %fields.model,
        user = %fields.user,
        pool = decision.pool.as_deref().unwrap_or("-"),
        endpoint = %decision.endpoint,
        sticky = decision.sticky,
        "Routing chat completion"
    );

    let request = ForwardRequest {
        method,
        path: uri.path().to_string(),
        headers,
        body,
    };
    forward(&state.http_client, &decision.endpoint, request).await
}

/// Merge `/v1/models` from every configured endpoint.
#[tracing::instrument(skip_all)]
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<Value> {
    let merged = aggregate_models(&state.http_client, state.routing.table()).await;
    Json(Value::Object(merged))
}

/// Liveness check.
pub async fn health() -> &'static str {
    "ok"
}

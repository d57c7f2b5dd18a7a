//! API layer for the model router.
//!
//! HTTP handlers, request classification, the streaming forwarder and the
//! serve loop.

pub mod disconnect;
pub mod handlers;
pub mod models;
pub mod proxy;
pub mod server;

pub use handlers::{
    build_router, chat_completions, create_http_client, health, list_models, AppState,
};
pub use models::RoutingFields;
pub use proxy::{forward, ForwardRequest};
pub use server::{serve, ServeOutcome};

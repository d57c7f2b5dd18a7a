//! Model Router - a model-aware reverse proxy for inference backends
//!
//! Backends are grouped into named pools, each serving a set of models.
//! A chat completion naming a model is routed to a pool, then to one of the
//! pool's endpoints, and the backend's response is streamed back verbatim.
//!
//! - **Model resolution**: exact model matches beat wildcard (`*`) pools
//! - **Round-robin**: lock-free per-pool cursor
//! - **Session affinity**: a `(user, model)` pair sticks to its first endpoint
//! - **Model discovery**: `/v1/models` merged across every backend
//!
//! # Architecture
//!
//! - [`core`]: configuration, errors, logging, middleware
//! - [`services`]: pool table, affinity store, routing, model aggregation
//! - [`api`]: HTTP handlers and the streaming forwarder

pub mod api;
pub mod core;
pub mod services;

pub use crate::api::{build_router, serve, AppState, ServeOutcome};
pub use crate::core::{AppError, ConfigError, PoolConfig, Result, RouterConfig};
pub use crate::services::{AffinityStore, Pool, PoolTable, RouteDecision, RoutingService};

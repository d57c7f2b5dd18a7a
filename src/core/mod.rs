//! Core functionality for the model router.
//!
//! - Configuration loading
//! - Error handling
//! - Logging and request context
//! - HTTP middleware

pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;

pub use config::{PoolConfig, RouterConfig, WILDCARD_MODEL};
pub use error::{AppError, ConfigError, Result};
pub use logging::{generate_request_id, get_request_id, init_tracing, REQUEST_ID};
pub use middleware::request_id_middleware;

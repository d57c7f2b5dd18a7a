//! Routing logic: pool resolution, endpoint selection, session affinity
//! and model aggregation.

pub mod affinity;
pub mod model_aggregator;
pub mod pool_table;
pub mod routing_service;

pub use affinity::{AffinityKey, AffinityStore};
pub use model_aggregator::{aggregate_models, fetch_models, merge_model_listings};
pub use pool_table::{Pool, PoolTable};
pub use routing_service::{RouteDecision, RoutingService};

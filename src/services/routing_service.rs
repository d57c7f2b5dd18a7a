//! Routing decisions for chat requests.
//!
//! Consults the affinity store first; on a miss resolves the model to a
//! pool, picks an endpoint and binds it before the request is forwarded.

use crate::core::config::RouterConfig;
use crate::core::Result;
use crate::services::affinity::AffinityStore;
use crate::services::pool_table::PoolTable;
use std::sync::Arc;

/// Where a request goes and how that was decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub endpoint: String,
    /// Pool the endpoint was picked from; `None` when served from affinity
    pub pool: Option<String>,
    pub sticky: bool,
}

/// Router object owning the pool table and affinity store.
#[derive(Clone)]
pub struct RoutingService {
    table: Arc<PoolTable>,
    affinity: Arc<AffinityStore>,
}

impl RoutingService {
    pub fn new(table: PoolTable) -> Self {
        Self::with_affinity(table, AffinityStore::new())
    }

    pub fn with_affinity(table: PoolTable, affinity: AffinityStore) -> Self {
        Self {
            table: Arc::new(table),
            affinity: Arc::new(affinity),
        }
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(PoolTable::from_config(config))
    }

    pub fn table(&self) -> &PoolTable {
        &self.table
    }

    pub fn affinity(&self) -> &AffinityStore {
        &self.affinity
    }

    /// Decide the endpoint for `(user, model)`.
    pub fn route(&self, user: &str, model: &str) -> Result<RouteDecision> {
        if let Some(endpoint) = self.affinity.lookup(user, model) {
            tracing::debug!(user = %user, model = %model, endpoint = %endpoint, "Affinity hit");
            return Ok(RouteDecision {
                endpoint,
                pool: None,
                sticky: true,
            });
        }

        let pool = self.table.resolve(model)?;
        let picked = pool.select();
        let endpoint = self.affinity.bind(user, model, picked);

        if endpoint != picked {
            tracing::debug!(
                user = %user,
                model = %model,
                picked = %picked,
                endpoint = %endpoint,
                "Concurrent request bound first; using its endpoint"
            );
        }

        tracing::debug!(
            user = %user,
            model = %model,
            pool = %pool.name(),
            endpoint = %endpoint,
            "Bound new affinity"
        );

        Ok(RouteDecision {
            endpoint,
            pool: Some(pool.name().to_string()),
            sticky: false,
        })
    }

    /// Log the pool table at startup.
    pub fn log_pools(&self) {
        for pool in self.table.pools() {
            tracing::info!(
                pool = %pool.name(),
                endpoints = ?pool.endpoints(),
                models = ?pool.models(),
                "Pool loaded"
            );
        }
    }
}

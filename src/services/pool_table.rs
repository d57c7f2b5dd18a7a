//! Pool table, model resolution and endpoint selection.
//!
//! The table is immutable once built. The only mutable state is each pool's
//! round-robin cursor, which is advanced with an atomic increment so that
//! concurrent selections never share a counter value.

use crate::core::config::{PoolConfig, RouterConfig, WILDCARD_MODEL};
use crate::core::{AppError, Result};
use std::sync::atomic::{AtomicU64, Ordering};

/// A named group of interchangeable backend endpoints.
#[derive(Debug)]
pub struct Pool {
    name: String,
    endpoints: Vec<String>,
    models: Vec<String>,
    cursor: AtomicU64,
}

impl Pool {
    pub fn new(name: impl Into<String>, endpoints: Vec<String>, models: Vec<String>) -> Self {
        Self {
            name: name.into(),
            endpoints,
            models,
            cursor: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Whether the model list contains `model` verbatim.
    pub fn serves_exactly(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    pub fn is_wildcard(&self) -> bool {
        self.serves_exactly(WILDCARD_MODEL)
    }

    /// Pick an endpoint round-robin.
    ///
    /// A single-endpoint pool never touches the cursor. Otherwise the cursor
    /// is incremented and the new value taken modulo the endpoint count, so
    /// the first pick is `endpoints[1]`. The counter wraps on overflow, which
    /// only shifts the phase.
    pub fn select(&self) -> &str {
        if self.endpoints.len() == 1 {
            return &self.endpoints[0];
        }
        let ticket = self.cursor.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        let idx = (ticket % self.endpoints.len() as u64) as usize;
        &self.endpoints[idx]
    }
}

impl From<PoolConfig> for Pool {
    fn from(config: PoolConfig) -> Self {
        Pool::new(config.name, config.endpoints, config.models)
    }
}

/// Ordered, read-only list of pools.
#[derive(Debug, Default)]
pub struct PoolTable {
    pools: Vec<Pool>,
}

impl PoolTable {
    pub fn new(pools: Vec<Pool>) -> Self {
        Self { pools }
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(config.pools.iter().cloned().map(Pool::from).collect())
    }

    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Resolve a model to the pool that serves it.
    ///
    /// Exact matches win over wildcard pools regardless of table position.
    /// Among several exact (or several wildcard) pools the first listed wins.
    pub fn resolve(&self, model: &str) -> Result<&Pool> {
        self.pools
            .iter()
            .find(|p| p.serves_exactly(model))
            .or_else(|| self.pools.iter().find(|p| p.is_wildcard()))
            .ok_or_else(|| AppError::NoPoolForModel(model.to_string()))
    }

    /// Every endpoint in table order, duplicates included.
    pub fn all_endpoints(&self) -> impl Iterator<Item = &str> {
        self.pools
            .iter()
            .flat_map(|p| p.endpoints.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn scenario_table() -> PoolTable {
        PoolTable::new(vec![
            Pool::new("A", strings(&["e1", "e2"]), strings(&["gpt-x"])),
            Pool::new("B", strings(&["e3"]), strings(&["*"])),
        ])
    }

    #[test]
    fn test_resolve_exact_and_wildcard() {
        let table = scenario_table();

        assert_eq!(table.resolve("gpt-x").unwrap().name(), "A");

        let fallback = table.resolve("other").unwrap();
        assert_eq!(fallback.name(), "B");
        assert_eq!(fallback.select(), "e3");
    }

    #[test]
    fn test_exact_beats_earlier_wildcard() {
        let table = PoolTable::new(vec![
            Pool::new("W", strings(&["w1"]), strings(&["*"])),
            Pool::new("P", strings(&["p1"]), strings(&["llama"])),
        ]);

        assert_eq!(table.resolve("llama").unwrap().name(), "P");
        assert_eq!(table.resolve("mistral").unwrap().name(), "W");
    }

    #[test]
    fn test_first_exact_match_wins() {
        let table = PoolTable::new(vec![
            Pool::new("first", strings(&["a"]), strings(&["m"])),
            Pool::new("second", strings(&["b"]), strings(&["m"])),
        ]);
        assert_eq!(table.resolve("m").unwrap().name(), "first");
    }

    #[test]
    fn test_first_wildcard_wins() {
        let table = PoolTable::new(vec![
            Pool::new("specific", strings(&["a"]), strings(&["m"])),
            Pool::new("w1", strings(&["b"]), strings(&["x", "*"])),
            Pool::new("w2", strings(&["c"]), strings(&["*"])),
        ]);
        assert_eq!(table.resolve("unknown").unwrap().name(), "w1");
    }

    #[test]
    fn test_no_pool_for_model() {
        let table = PoolTable::new(vec![Pool::new("A", strings(&["e1"]), strings(&["m"]))]);
        let err = table.resolve("other").unwrap_err();
        assert!(matches!(err, AppError::NoPoolForModel(ref m) if m == "other"));

        assert!(PoolTable::default().resolve("m").is_err());
    }

    #[test]
    fn test_round_robin_order() {
        let pool = Pool::new("A", strings(&["e1", "e2", "e3"]), vec![]);
        let picks: Vec<&str> = (0..7).map(|_| pool.select()).collect();
        assert_eq!(picks, vec!["e2", "e3", "e1", "e2", "e3", "e1", "e2"]);
    }

    #[test]
    fn test_single_endpoint_leaves_cursor() {
        let pool = Pool::new("solo", strings(&["only"]), vec![]);
        for _ in 0..5 {
            assert_eq!(pool.select(), "only");
        }
        assert_eq!(pool.cursor.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_cursor_wraps() {
        let pool = Pool::new("A", strings(&["e1", "e2"]), vec![]);
        pool.cursor.store(u64::MAX, Ordering::Relaxed);
        // u64::MAX + 1 wraps to 0
        assert_eq!(pool.select(), "e1");
        assert_eq!(pool.select(), "e2");
    }

    #[test]
    fn test_concurrent_selection_is_even() {
        let pool = Arc::new(Pool::new("A", strings(&["e1", "e2", "e3", "e4"]), vec![]));
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    (0..1000)
                        .map(|_| pool.select().to_string())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut counts = std::collections::HashMap::new();
        for t in threads {
            for ep in t.join().unwrap() {
                *counts.entry(ep).or_insert(0usize) += 1;
            }
        }

        assert_eq!(counts.len(), 4);
        for count in counts.values() {
            assert_eq!(*count, 2000);
        }
    }

    #[test]
    fn test_all_endpoints_keeps_duplicates() {
        let table = PoolTable::new(vec![
            Pool::new("A", strings(&["e1", "e2"]), vec![]),
            Pool::new("B", strings(&["e2"]), vec![]),
        ]);
        let eps: Vec<&str> = table.all_endpoints().collect();
        assert_eq!(eps, vec!["e1", "e2", "e2"]);
        let unique: HashSet<&str> = eps.into_iter().collect();
        assert_eq!(unique.len(), 2);
    }
}

//! Property-based tests for model resolution and endpoint selection.

use model_router::{AffinityStore, Pool, PoolTable};
use proptest::prelude::*;
use std::collections::HashMap;

fn endpoints_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("http://[a-z]{3,8}:[0-9]{4}", 1..=8)
}

proptest! {
    /// An exact pool wins over any number of wildcard pools listed before it.
    #[test]
    fn prop_exact_beats_earlier_wildcards(
        model in "[a-z0-9-]{1,12}",
        wildcards_before in 1usize..5,
        wildcards_after in 0usize..3,
    ) {
        let mut pools = Vec::new();
        for i in 0..wildcards_before {
            pools.push(Pool::new(format!("w{}", i), vec![format!("http://w{}", i)], vec!["*".to_string()]));
        }
        pools.push(Pool::new("exact", vec!["http://exact".to_string()], vec![model.clone()]));
        for i in 0..wildcards_after {
            pools.push(Pool::new(format!("late{}", i), vec![format!("http://late{}", i)], vec!["*".to_string()]));
        }
        let table = PoolTable::new(pools);

        prop_assert_eq!(table.resolve(&model).unwrap().name(), "exact");
    }

    /// Any window of N consecutive selections visits each endpoint once, in
    /// list order, starting one past the cursor.
    #[test]
    fn prop_round_robin_window_is_fair(
        endpoints in endpoints_strategy(),
        warmup in 0usize..50,
    ) {
        let pool = Pool::new("p", endpoints.clone(), vec![]);
        for _ in 0..warmup {
            pool.select();
        }

        let n = endpoints.len();
        let window: Vec<String> = (0..n).map(|_| pool.select().to_string()).collect();

        let mut counts: HashMap<usize, usize> = HashMap::new();
        for (offset, picked) in window.iter().enumerate() {
            let idx = (warmup + offset + 1) % n;
            prop_assert_eq!(picked, &endpoints[idx]);
            *counts.entry(idx).or_default() += 1;
        }
        prop_assert!(counts.values().all(|&c| c == 1));
        prop_assert_eq!(counts.len(), n);
    }

    /// A binding, once made, is returned for every later lookup.
    #[test]
    fn prop_affinity_is_idempotent(
        user in ".{0,16}",
        model in ".{0,16}",
        first in "http://[a-z]{1,8}",
        later in prop::collection::vec("http://[a-z]{1,8}", 0..10),
    ) {
        let store = AffinityStore::new();
        store.bind(&user, &model, &first);
        for endpoint in &later {
            store.bind(&user, &model, endpoint);
            store.bind(&format!("{}x", user), &model, endpoint);
        }
        prop_assert_eq!(store.lookup(&user, &model), Some(first));
    }
}

//! Best-effort model discovery across every configured endpoint.
//!
//! Each endpoint's `/v1/models` document is fetched concurrently and the
//! top-level keys are merged in table order, so a later endpoint overwrites
//! an earlier one on key collision. Failed endpoints are logged and skipped.

use crate::core::{AppError, Result};
use crate::services::pool_table::PoolTable;
use serde_json::{Map, Value};

pub const MODELS_PATH: &str = "/v1/models";

/// Merge per-endpoint results in order. Later keys win; errors are skipped.
pub fn merge_model_listings(
    results: impl IntoIterator<Item = Result<Map<String, Value>>>,
) -> Map<String, Value> {
    let mut combined = Map::new();
    for result in results {
        match result {
            Ok(listing) => combined.extend(listing),
            Err(e) => tracing::warn!(error = %e, "Skipping endpoint in model listing"),
        }
    }
    combined
}

/// Fetch and decode one endpoint's model listing.
pub async fn fetch_models(client: &reqwest::Client, endpoint: &str) -> Result<Map<String, Value>> {
    let failure = |reason: String| AppError::BackendPartialFailure {
        endpoint: endpoint.to_string(),
        reason,
    };

    let url = format!("{}{}", endpoint, MODELS_PATH);
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| failure(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(failure(format!("HTTP {}", status)));
    }

    match response.json::<Value>().await {
        Ok(Value::Object(listing)) => Ok(listing),
        Ok(_) => Err(failure("response is not a JSON object".to_string())),
        Err(e) => Err(failure(e.to_string())),
    }
}

/// Query every endpoint of every pool and merge the listings.
pub async fn aggregate_models(client: &reqwest::Client, table: &PoolTable) -> Map<String, Value> {
    let fetches = table
        .all_endpoints()
        .map(|endpoint| fetch_models(client, endpoint));

    let results = futures::future::join_all(fetches).await;
    let merged = merge_model_listings(results);

    tracing::debug!(
        endpoints = table.all_endpoints().count(),
        keys = merged.len(),
        "Aggregated model listings"
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(value: Value) -> Result<Map<String, Value>> {
        match value {
            Value::Object(map) => Ok(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_later_listing_overwrites() {
        let merged = merge_model_listings(vec![
            listing(json!({"foo": 1, "a": true})),
            listing(json!({"foo": 2})),
        ]);
        assert_eq!(merged.get("foo"), Some(&json!(2)));
        assert_eq!(merged.get("a"), Some(&json!(true)));
    }

    #[test]
    fn test_failures_are_skipped() {
        let merged = merge_model_listings(vec![
            listing(json!({"foo": 1})),
            Err(AppError::BackendPartialFailure {
                endpoint: "http://down".to_string(),
                reason: "connection refused".to_string(),
            }),
            listing(json!({"bar": 2})),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("foo"), Some(&json!(1)));
    }

    #[test]
    fn test_no_endpoints_yields_empty_object() {
        assert!(merge_model_listings(Vec::new()).is_empty());
    }
}

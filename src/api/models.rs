//! Request models for the routing API.

use serde::Deserialize;

/// The two fields of a chat completion body that drive routing.
///
/// Every other field is ignored here and forwarded untouched.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RoutingFields {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub user: String,
}

impl RoutingFields {
    /// Extract routing fields from a buffered request body.
    ///
    /// Bodies that are not JSON objects, or fields that are not strings, yield
    /// empty values rather than an error. An empty model can still match a
    /// wildcard pool.
    pub fn classify(body: &[u8]) -> Self {
        match serde_json::from_slice::<RoutingFields>(body) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::debug!(error = %e, "Request body not classifiable; using empty model/user");
                Self::default()
            }
        }
    }
}

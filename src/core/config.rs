//! Pool table configuration for the model router.
//!
//! The pool file is YAML with support for environment variable expansion.
//! It is read once at startup; a malformed file is fatal.

use crate::core::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Token in a pool's model list that matches any model not claimed elsewhere.
pub const WILDCARD_MODEL: &str = "*";

/// Top-level router configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Pools in table order. Order decides tie-breaks during model resolution.
    #[serde(default)]
    pub pools: Vec<PoolConfig>,

    /// Overall timeout for a backend call. Unset means no timeout.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Timeout for establishing a backend connection. Unset means no timeout.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    /// Whether to verify TLS certificates of backends
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

/// A named group of interchangeable backend endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolConfig {
    /// Pool name, used for diagnostics only
    pub name: String,

    /// Backend base URLs, e.g. `http://10.0.0.1:8000`
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Model identifiers served by this pool; may contain [`WILDCARD_MODEL`]
    #[serde(default)]
    pub models: Vec<String>,
}

fn default_verify_ssl() -> bool {
    true
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            pools: Vec::new(),
            request_timeout_secs: None,
            connect_timeout_secs: None,
            verify_ssl: default_verify_ssl(),
        }
    }
}

impl RouterConfig {
    /// Load and validate the pool file at `path`.
    ///
    /// `VERIFY_SSL` and `REQUEST_TIMEOUT_SECS` in the environment override
    /// the values from the file.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use model_router::core::config::RouterConfig;
    ///
    /// let config = RouterConfig::load("pools.yaml").expect("Failed to load pools");
    /// ```
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let mut config = Self::from_yaml(&content, &path.display().to_string())?;

        if let Ok(verify_ssl_str) = std::env::var("VERIFY_SSL") {
            config.verify_ssl = str_to_bool(&verify_ssl_str);
        }

        if let Ok(timeout_str) = std::env::var("REQUEST_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout_str.parse::<u64>() {
                config.request_timeout_secs = Some(timeout);
            }
        }

        Ok(config)
    }

    /// Parse and validate configuration from YAML text.
    ///
    /// `origin` names the source in parse errors, usually the file path.
    pub fn from_yaml(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content);

        // An empty document deserializes to unit, not a mapping
        let config: RouterConfig = if expanded.trim().is_empty() {
            RouterConfig::default()
        } else {
            serde_yaml::from_str(&expanded).map_err(|source| ConfigError::Parse {
                path: origin.to_string(),
                source,
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Check structural invariants of the pool table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pool in &self.pools {
            if pool.endpoints.is_empty() {
                return Err(ConfigError::EmptyPool {
                    name: pool.name.clone(),
                });
            }
        }

        if self.pools.is_empty() {
            tracing::warn!("Pool table is empty; every chat request will be rejected");
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    /// Total number of endpoints across all pools, duplicates included.
    pub fn endpoint_count(&self) -> usize {
        self.pools.iter().map(|p| p.endpoints.len()).sum()
    }
}

/// Expand environment variables in configuration content.
///
/// Supports patterns: ${VAR}, ${VAR:-default}, ${VAR:default}
fn expand_env_vars(content: &str) -> String {
    let re = Regex::new(r"\$\{([^}:]+)(?::-?([^}]*))?\}").expect("static regex is valid");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var_name).unwrap_or_else(|_| default_value.to_string())
    })
    .to_string()
}

/// Convert string to boolean.
///
/// Accepts: "true", "1", "yes", "on" (case-insensitive)
fn str_to_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

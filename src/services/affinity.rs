//! Sticky-session store mapping `(user, model)` to a backend endpoint.
//!
//! Entries live for the lifetime of the process and are never replaced.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Composite key. A struct key avoids delimiter collisions such as
/// `("a:b", "c")` vs `("a", "b:c")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AffinityKey {
    pub user: String,
    pub model: String,
}

impl AffinityKey {
    pub fn new(user: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            model: model.into(),
        }
    }
}

/// Concurrent `(user, model) -> endpoint` map backed by a sharded [`DashMap`].
#[derive(Debug, Default)]
pub struct AffinityStore {
    entries: DashMap<AffinityKey, String>,
}

impl AffinityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, user: &str, model: &str) -> Option<String> {
        self.entries
            .get(&AffinityKey::new(user, model))
            .map(|e| e.value().clone())
    }

    /// Bind `endpoint` to the key unless a binding already exists.
    ///
    /// Returns the endpoint that is bound after the call. When two first
    /// requests for the same key race, both get the winner's endpoint back.
    pub fn bind(&self, user: &str, model: &str, endpoint: &str) -> String {
        match self.entries.entry(AffinityKey::new(user, model)) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => slot.insert(endpoint.to_string()).value().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

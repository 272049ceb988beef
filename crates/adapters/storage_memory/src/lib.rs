//! # hearth-adapter-storage-memory
//!
//! In-memory implementation of the [`KeyValStore`] port. Holds everything in
//! a `HashMap` behind a mutex; cloning the store clones a handle to the same
//! entries. Useful for tests and for running a hub without persistence.
//!
//! ## Dependency rule
//!
//! Depends on `hearth-app` (port traits) and `hearth-domain` only.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use hearth_app::ports::KeyValStore;
use hearth_domain::error::HearthError;

/// Cloneable in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("store lock poisoned").len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValStore for MemoryStore {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, HearthError>> + Send {
        let value = self
            .entries
            .lock()
            .expect("store lock poisoned")
            .get(key)
            .cloned();
        async move { Ok(value) }
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), HearthError>> + Send {
        self.entries
            .lock()
            .expect("store lock poisoned")
            .insert(key.to_string(), value.to_string());
        async { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_return_none_for_missing_key() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_roundtrip_a_value() {
        let store = MemoryStore::new();
        store.set("room.lights", "1").await.unwrap();
        assert_eq!(store.get("room.lights").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn should_overwrite_existing_value() {
        let store = MemoryStore::new();
        store.set("k", "1").await.unwrap();
        store.set("k", "0").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn should_share_entries_between_clones() {
        let store = MemoryStore::new();
        let clone = store.clone();
        store.set("shared", "1").await.unwrap();
        assert_eq!(clone.get("shared").await.unwrap().as_deref(), Some("1"));
        assert_eq!(clone.len(), 1);
    }
}

//! Storage port — the string-keyed store backing the keyval substrate.
//!
//! The storage engine itself lives in an adapter crate; the substrate only
//! reads and writes through this trait. Keys are dot-delimited strings.

use std::future::Future;
use std::sync::Arc;

use hearth_domain::error::HearthError;

/// Primitive get/set access to the shared string-keyed store.
pub trait KeyValStore: Send + Sync {
    /// Read a value, `None` when the key was never written.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, HearthError>> + Send;

    /// Write a value, overwriting any previous one.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), HearthError>> + Send;
}

impl<T: KeyValStore + Send + Sync> KeyValStore for Arc<T> {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, HearthError>> + Send {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), HearthError>> + Send {
        (**self).set(key, value)
    }
}

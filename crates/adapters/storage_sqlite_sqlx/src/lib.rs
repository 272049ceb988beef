//! # hearth-adapter-storage-sqlite-sqlx
//!
//! `SQLite` implementation of the keyval storage port, backed by sqlx.
//! One table, keyed by the dot-delimited key string; writes upsert.
//!
//! ## Dependency rule
//!
//! Depends on `hearth-app` (port traits) and `hearth-domain` only.

mod error;
mod keyval_store;
mod pool;

pub use error::StorageError;
pub use keyval_store::SqliteKeyValStore;
pub use pool::{Config, Database};

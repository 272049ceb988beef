//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the substrate core and the outside
//! world. They are defined here so that both the core and the adapter layer
//! can depend on them without creating circular dependencies.

pub mod keyval_store;

pub use keyval_store::KeyValStore;

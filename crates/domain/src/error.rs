//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HearthError`]
//! via `From` at the port boundary.

/// Top-level error for the hearth substrate.
#[derive(Debug, thiserror::Error)]
pub enum HearthError {
    /// A key string could not be parsed into a [`KeyPath`](crate::key::KeyPath).
    #[error("invalid key {key:?}")]
    InvalidKey {
        /// The offending key string.
        key: String,
    },

    /// A module facade was requested for a name nobody registered.
    #[error("module {name:?} is not registered")]
    UnknownModule {
        /// The unregistered module name.
        name: String,
    },

    /// The target module was torn down before a queued request was handled.
    #[error("queued request was dropped before the target module handled it")]
    RequestDropped,

    /// A broadcast payload could not be serialized.
    #[error("failed to encode broadcast payload")]
    Encode(#[from] serde_json::Error),

    /// An error propagated from the storage adapter.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A failure raised by a request handler or listener callback.
    #[error("{0}")]
    Handler(String),
}

impl HearthError {
    /// Wrap an adapter error as a [`HearthError::Storage`].
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }

    /// Build a [`HearthError::Handler`] from a message.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }
}

//! Listener registrations for the keyval pub-sub core.
//!
//! The table owns every live registration, keyed by a monotonically
//! increasing id (ids are never reused). Dispatch works on a **stable
//! snapshot** taken before any callback runs, so removal during iteration —
//! a listener removing itself or another one — can never skip or double-fire
//! an entry. The [`KeyVal`](crate::keyval::KeyVal) service drives dispatch;
//! this module only stores and matches.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use hearth_domain::error::HearthError;
use hearth_domain::key::KeyPath;
use hearth_domain::log::LogContext;

/// Shared listener callback: receives the updated value and the update's
/// log context.
pub type ListenerFn =
    Arc<dyn Fn(String, LogContext) -> BoxFuture<'static, Result<(), HearthError>> + Send + Sync>;

/// Wrap an async closure as a [`ListenerFn`].
pub fn listener<F, Fut>(callback: F) -> ListenerFn
where
    F: Fn(String, LogContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HearthError>> + Send + 'static,
{
    Arc::new(move |value, ctx| Box::pin(callback(value, ctx)))
}

/// Opaque handle returned by listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

struct Registration {
    pattern: Option<KeyPath>,
    callback: ListenerFn,
    once: bool,
}

/// One entry of a dispatch snapshot.
pub(crate) struct Matched {
    pub id: u64,
    pub callback: ListenerFn,
    pub once: bool,
}

#[derive(Default)]
struct TableInner {
    next_id: u64,
    entries: BTreeMap<u64, Registration>,
}

/// Registration table for keyval listeners.
#[derive(Default)]
pub struct ListenerTable {
    inner: Mutex<TableInner>,
}

impl ListenerTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. `pattern = None` matches every update.
    pub fn add(&self, pattern: Option<KeyPath>, callback: ListenerFn, once: bool) -> ListenerHandle {
        let mut inner = self.inner.lock().expect("listener table lock poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.insert(
            id,
            Registration {
                pattern,
                callback,
                once,
            },
        );
        ListenerHandle(id)
    }

    /// Delete a registration. Safe to call from inside a firing callback.
    pub fn remove(&self, handle: ListenerHandle) {
        self.remove_id(handle.0);
    }

    /// Number of live registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("listener table lock poisoned")
            .entries
            .len()
    }

    /// Whether no registrations are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot, in registration order, of every entry matching `key`.
    pub(crate) fn matching(&self, key: &KeyPath) -> Vec<Matched> {
        let inner = self.inner.lock().expect("listener table lock poisoned");
        inner
            .entries
            .iter()
            .filter(|(_, registration)| {
                registration
                    .pattern
                    .as_ref()
                    .is_none_or(|pattern| pattern.overlaps(key))
            })
            .map(|(id, registration)| Matched {
                id: *id,
                callback: Arc::clone(&registration.callback),
                once: registration.once,
            })
            .collect()
    }

    /// Whether a snapshot entry is still registered.
    pub(crate) fn is_live(&self, id: u64) -> bool {
        self.inner
            .lock()
            .expect("listener table lock poisoned")
            .entries
            .contains_key(&id)
    }

    pub(crate) fn remove_id(&self, id: u64) {
        self.inner
            .lock()
            .expect("listener table lock poisoned")
            .entries
            .remove(&id);
    }
}

//! The keyval module — owner of the pub-sub substrate.
//!
//! Holds the listener table, the group propagator, and the store handle, and
//! registers itself with the module gateway under the name `"keyval"`. Every
//! other module reads and writes shared state through the
//! [`KeyValHandle`] facade; updates dispatch matching listeners
//! sequentially and then mirror configured group targets into the store.

use std::sync::Arc;

use hearth_domain::error::HearthError;
use hearth_domain::flag;
use hearth_domain::group::GroupConfig;
use hearth_domain::key::KeyPath;
use hearth_domain::log::LogContext;

use crate::gateway::{ExternalHandle, ModuleGateway};
use crate::ports::KeyValStore;
use crate::propagator::GroupPropagator;
use crate::router::{ListenerFn, ListenerHandle, ListenerTable};

/// Options for listener registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerOpts {
    /// Remove the registration after its first firing.
    pub once: bool,
    /// Immediately fetch the current value through the keyval module's own
    /// external facade and invoke the callback once with it, independent of
    /// the main dispatch path.
    pub notify_on_initial: bool,
}

/// The keyval module service.
pub struct KeyVal<S> {
    gateway: Arc<ModuleGateway>,
    store: S,
    table: ListenerTable,
    propagator: GroupPropagator<S>,
}

impl<S> KeyVal<S>
where
    S: KeyValStore + Clone + 'static,
{
    /// The module name this service registers with the gateway.
    pub const MODULE: &'static str = "keyval";

    /// Build the service and register its module slot (initialization
    /// required — external calls queue until [`init`](Self::init) runs).
    pub fn new(gateway: Arc<ModuleGateway>, store: S, groups: GroupConfig) -> Arc<Self> {
        gateway.register(Self::MODULE, true);
        Arc::new(Self {
            propagator: GroupPropagator::new(groups, store.clone()),
            gateway,
            store,
            table: ListenerTable::new(),
        })
    }

    /// Seed default aggregate keys, then mark the module ready and drain
    /// its queued external calls.
    ///
    /// Every `aggregates.<name>` key missing from the store is initialized
    /// to `"0"` so aggregate switches always read as a flag.
    ///
    /// # Errors
    ///
    /// Propagates storage errors from seeding and handler errors surfaced
    /// by the gateway drain.
    pub async fn init(&self, aggregates: &[String]) -> Result<(), HearthError> {
        for name in aggregates {
            let key = format!("aggregates.{name}");
            if self.store.get(&key).await?.is_none() {
                tracing::debug!(key = %key, "seeding aggregate default");
                self.store.set(&key, flag::OFF).await?;
            }
        }
        self.gateway.init(Self::MODULE).await
    }

    /// Build the external facade for this module.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::UnknownModule`] when the module slot is gone
    /// (never the case for a service built through [`new`](Self::new)).
    pub fn external(
        self: &Arc<Self>,
        ctx: LogContext,
        source: impl Into<String>,
    ) -> Result<KeyValHandle<S>, HearthError> {
        Ok(KeyValHandle {
            inner: self.gateway.external(Self::MODULE, ctx, source)?,
            service: Arc::clone(self),
        })
    }

    /// Register a listener against a key prefix, or against every update
    /// when `key` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::InvalidKey`] when `key` is an empty string.
    pub fn add_listener(
        self: &Arc<Self>,
        key: Option<&str>,
        callback: ListenerFn,
        opts: ListenerOpts,
    ) -> Result<ListenerHandle, HearthError> {
        let pattern = key.map(KeyPath::parse).transpose()?;

        if opts.notify_on_initial
            && let Some(pattern) = &pattern
        {
            self.spawn_initial_notify(pattern.to_string(), Arc::clone(&callback));
        }

        Ok(self.table.add(pattern, callback, opts.once))
    }

    /// Delete a listener registration. Safe to call from inside a firing
    /// callback.
    pub fn remove_listener(&self, handle: ListenerHandle) {
        self.table.remove(handle);
    }

    /// Dispatch an updated key/value pair.
    ///
    /// Matching listeners (wildcard, or key-prefix overlap in either
    /// direction) run sequentially, awaited one at a time, in registration
    /// order; a `once` listener is removed right after it fires. Afterwards
    /// the group propagator mirrors configured targets — regardless of
    /// whether any listener matched. Returns the number of listeners that
    /// ran.
    ///
    /// # Errors
    ///
    /// The first listener error aborts the remaining listeners **and**
    /// skips group propagation for this call (fail-fast). Storage errors
    /// from propagation propagate as well.
    pub async fn update(
        &self,
        key: &str,
        value: &str,
        ctx: &LogContext,
    ) -> Result<usize, HearthError> {
        let path = KeyPath::parse(key)?;
        let snapshot = self.table.matching(&path);
        let mut updated = 0;

        for entry in snapshot {
            // Entries removed since the snapshot (by an earlier listener in
            // this very dispatch) must not fire.
            if !self.table.is_live(entry.id) {
                continue;
            }
            (entry.callback)(value.to_string(), ctx.clone()).await?;
            updated += 1;
            if entry.once {
                self.table.remove_id(entry.id);
            }
        }

        ctx.append(format!("updated {updated} listeners for {path}"));
        tracing::debug!(key = %path, value, updated, "dispatched keyval update");

        self.propagator.propagate(&path, value, ctx).await?;
        Ok(updated)
    }

    /// Read a value; keys never written read as `"0"`.
    async fn read(&self, key: &str) -> Result<String, HearthError> {
        Ok(self
            .store
            .get(key)
            .await?
            .unwrap_or_else(|| flag::OFF.to_string()))
    }

    /// Write a value and, when `notify`, dispatch the update.
    async fn write(
        &self,
        key: &str,
        value: &str,
        notify: bool,
        ctx: &LogContext,
    ) -> Result<usize, HearthError> {
        self.store.set(key, value).await?;
        if notify {
            self.update(key, value, ctx).await
        } else {
            Ok(0)
        }
    }

    fn spawn_initial_notify(self: &Arc<Self>, key: String, callback: ListenerFn) {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let ctx = LogContext::new();
            let result = async {
                let handle = service.external(ctx.clone(), "keyval.ADD_LISTENER")?;
                let value = handle.get(&key).await?;
                callback(value, ctx.clone()).await
            }
            .await;
            if let Err(err) = result {
                tracing::warn!(key = %key, error = %err, "initial-value notification failed");
            }
        });
    }
}

/// External facade of the keyval module.
///
/// All operations go through [`ExternalHandle::run_request`], so calls made
/// before the module initialized are queued and replayed in order.
pub struct KeyValHandle<S> {
    inner: ExternalHandle,
    service: Arc<KeyVal<S>>,
}

impl<S> KeyValHandle<S>
where
    S: KeyValStore + Clone + 'static,
{
    /// Read a key; missing keys read as `"0"`.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn get(&self, key: &str) -> Result<String, HearthError> {
        let service = Arc::clone(&self.service);
        let key = key.to_string();
        self.inner
            .run_request(move |sink, _ctx| async move {
                let value = service.read(&key).await?;
                sink.append(format!("key {key:?} read as {value:?}"));
                Ok(value)
            })
            .await
    }

    /// Write a key and, when `notify`, dispatch listeners and group
    /// effects. Returns the matched-listener count (`0` when silent).
    ///
    /// # Errors
    ///
    /// Propagates storage and listener errors.
    pub async fn set(&self, key: &str, value: &str, notify: bool) -> Result<usize, HearthError> {
        let service = Arc::clone(&self.service);
        let key = key.to_string();
        let value = value.to_string();
        self.inner
            .run_request(move |sink, _ctx| async move {
                sink.append(format!("setting {key:?} to {value:?}"));
                service.write(&key, &value, notify, &sink).await
            })
            .await
    }

    /// Flip a flag key and return the new value.
    ///
    /// # Errors
    ///
    /// Propagates storage and listener errors.
    pub async fn toggle(&self, key: &str) -> Result<String, HearthError> {
        let value = self.get(key).await?;
        let next = flag::invert(&value);
        self.set(key, next, true).await?;
        Ok(next.to_string())
    }

    /// Register a change listener through the module facade.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::InvalidKey`] for an empty key.
    pub async fn on_change(
        &self,
        key: &str,
        callback: ListenerFn,
        opts: ListenerOpts,
    ) -> Result<ListenerHandle, HearthError> {
        let service = Arc::clone(&self.service);
        let key = key.to_string();
        self.inner
            .run_request(move |_sink, _ctx| async move {
                service.add_listener(Some(&key), callback, opts)
            })
            .await
    }
}

//! One-hop group-effect propagation.
//!
//! When a key with a group entry changes, every configured target key is
//! written **directly through the store port** — never through
//! [`KeyVal::update`](crate::keyval::KeyVal::update). Mirrored writes
//! therefore never trigger listener dispatch or further propagation, which
//! bounds cascade depth to exactly one hop and rules out propagation cycles.

use hearth_domain::error::HearthError;
use hearth_domain::group::GroupConfig;
use hearth_domain::key::KeyPath;
use hearth_domain::log::LogContext;

use crate::ports::KeyValStore;

/// Applies configured group effects for changed keys.
pub struct GroupPropagator<S> {
    config: GroupConfig,
    store: S,
}

impl<S: KeyValStore> GroupPropagator<S> {
    /// Create a propagator over an immutable config and a store handle.
    pub fn new(config: GroupConfig, store: S) -> Self {
        Self { config, store }
    }

    /// Write every configured target for `key`. No-op without a config
    /// entry.
    ///
    /// # Errors
    ///
    /// Propagates storage errors from the target writes.
    pub async fn propagate(
        &self,
        key: &KeyPath,
        value: &str,
        ctx: &LogContext,
    ) -> Result<(), HearthError> {
        let Some(targets) = self.config.targets(key) else {
            ctx.append(format!("no group effects for {key}"));
            return Ok(());
        };

        for target in targets {
            let mirrored = target.effect.apply(value);
            ctx.append(format!(
                "group effect: setting {} to {mirrored:?} (store only)",
                target.key
            ));
            tracing::debug!(
                trigger = %key,
                target = %target.key,
                value = %mirrored,
                "applying group effect"
            );
            self.store.set(&target.key.to_string(), &mirrored).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::{Arc, Mutex};

    use hearth_domain::group::GroupEffect;

    use super::*;

    #[derive(Clone, Default)]
    struct FakeStore {
        entries: Arc<Mutex<HashMap<String, String>>>,
    }

    impl KeyValStore for FakeStore {
        fn get(
            &self,
            key: &str,
        ) -> impl Future<Output = Result<Option<String>, HearthError>> + Send {
            let value = self.entries.lock().unwrap().get(key).cloned();
            async move { Ok(value) }
        }

        fn set(
            &self,
            key: &str,
            value: &str,
        ) -> impl Future<Output = Result<(), HearthError>> + Send {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            async { Ok(()) }
        }
    }

    fn config() -> GroupConfig {
        let mut config = GroupConfig::default();
        let trigger = KeyPath::parse("trigger").unwrap();
        config.insert(
            trigger.clone(),
            KeyPath::parse("target.same").unwrap(),
            GroupEffect::Same,
        );
        config.insert(
            trigger,
            KeyPath::parse("target.invert").unwrap(),
            GroupEffect::Invert,
        );
        config
    }

    #[tokio::test]
    async fn should_mirror_and_invert_configured_targets() {
        let store = FakeStore::default();
        let propagator = GroupPropagator::new(config(), store.clone());
        let key = KeyPath::parse("trigger").unwrap();

        propagator
            .propagate(&key, "1", &LogContext::new())
            .await
            .unwrap();

        let entries = store.entries.lock().unwrap();
        assert_eq!(entries.get("target.same").map(String::as_str), Some("1"));
        assert_eq!(entries.get("target.invert").map(String::as_str), Some("0"));
    }

    #[tokio::test]
    async fn should_do_nothing_for_unconfigured_key() {
        let store = FakeStore::default();
        let propagator = GroupPropagator::new(config(), store.clone());
        let key = KeyPath::parse("unrelated").unwrap();

        propagator
            .propagate(&key, "1", &LogContext::new())
            .await
            .unwrap();

        assert!(store.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_note_applied_effects_in_log_context() {
        let store = FakeStore::default();
        let propagator = GroupPropagator::new(config(), store);
        let key = KeyPath::parse("trigger").unwrap();
        let ctx = LogContext::new();

        propagator.propagate(&key, "0", &ctx).await.unwrap();

        assert_eq!(ctx.entries().len(), 2);
    }
}

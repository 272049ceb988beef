//! Deduplicated outbound broadcast gate.
//!
//! Wraps a publish function so that repeating the last payload is a no-op.
//! The gate remembers the payload **before** the wrapped publisher runs, so
//! a failed publish followed by a retry of the identical payload is still
//! suppressed — a documented trade-off of the original behavior, kept
//! as-is.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Mutex;

use serde::Serialize;

use hearth_domain::error::HearthError;

/// Suppresses back-to-back publishes of an unchanged string payload.
pub struct DedupPublish<F> {
    last_payload: Mutex<Option<String>>,
    publish: F,
}

impl<F, Fut> DedupPublish<F>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<usize, HearthError>>,
{
    /// Wrap a publish function returning the number of notified subscribers.
    pub fn new(publish: F) -> Self {
        Self {
            last_payload: Mutex::new(None),
            publish,
        }
    }

    /// Publish `payload` unless it equals the previous one.
    ///
    /// Returns `Ok(0)` without touching the wrapped publisher on a
    /// duplicate; otherwise returns whatever the publisher returns.
    ///
    /// # Errors
    ///
    /// Failures of the wrapped publisher propagate untouched.
    pub async fn publish(&self, payload: impl Into<String>) -> Result<usize, HearthError> {
        let payload = payload.into();
        {
            let mut last = self.last_payload.lock().expect("dedup lock poisoned");
            if last.as_deref() == Some(payload.as_str()) {
                tracing::debug!("suppressing duplicate broadcast");
                return Ok(0);
            }
            *last = Some(payload.clone());
        }
        (self.publish)(payload).await
    }
}

/// Typed variant: serializes payloads to their canonical JSON encoding and
/// deduplicates on the encoded string.
///
/// The encoding is **insertion-order-sensitive** for maps: two structurally
/// equal objects whose keys were inserted in a different order count as
/// different payloads. That is the documented contract, not an accident.
pub struct TypedDedupPublish<T, F> {
    inner: DedupPublish<F>,
    _payload: PhantomData<fn(&T)>,
}

impl<T, F, Fut> TypedDedupPublish<T, F>
where
    T: Serialize,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<usize, HearthError>>,
{
    /// Wrap a publish function taking the encoded payload.
    pub fn new(publish: F) -> Self {
        Self {
            inner: DedupPublish::new(publish),
            _payload: PhantomData,
        }
    }

    /// Encode `payload` and publish it through the dedup gate.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::Encode`] when serialization fails; publisher
    /// failures propagate untouched.
    pub async fn publish(&self, payload: &T) -> Result<usize, HearthError> {
        let encoded = serde_json::to_string(payload)?;
        self.inner.publish(encoded).await
    }
}

//! Per-request log correlation.
//!
//! A [`LogContext`] is a cheaply-cloneable handle to an append-only list of
//! timestamped entries, identified by a correlation id. Callers hand one to
//! every cross-module call; work done on their behalf — including work that
//! was queued and ran much later — appends entries that stay attributable to
//! the originating request.
//!
//! The gateway gives each invocation a fresh sink context and drains it into
//! the caller's context once the call finishes, so the callee never needs to
//! know whether it ran immediately or deferred.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One timestamped correlation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// When the entry was appended.
    pub at: DateTime<Utc>,
    /// Free-form message.
    pub message: String,
}

/// Shared, appendable correlation context for one logical request.
#[derive(Debug, Clone)]
pub struct LogContext {
    id: Uuid,
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Default for LogContext {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl LogContext {
    /// Create a fresh context with a new correlation id.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The correlation id shared by all clones of this context.
    #[must_use]
    pub fn correlation_id(&self) -> Uuid {
        self.id
    }

    /// Append a message.
    pub fn append(&self, message: impl Into<String>) {
        let entry = LogEntry {
            at: Utc::now(),
            message: message.into(),
        };
        self.entries
            .lock()
            .expect("log context lock poisoned")
            .push(entry);
    }

    /// Move every entry of this context into `target`, preserving order.
    ///
    /// Used by the gateway to copy a callee's sink into the caller's
    /// context. Transferring a context into itself is a no-op.
    pub fn transfer_to(&self, target: &LogContext) {
        if Arc::ptr_eq(&self.entries, &target.entries) {
            return;
        }
        let drained: Vec<LogEntry> = {
            let mut entries = self.entries.lock().expect("log context lock poisoned");
            entries.drain(..).collect()
        };
        if drained.is_empty() {
            return;
        }
        target
            .entries
            .lock()
            .expect("log context lock poisoned")
            .extend(drained);
    }

    /// Snapshot of the entries appended so far.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .expect("log context lock poisoned")
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_share_entries_between_clones() {
        let ctx = LogContext::new();
        let clone = ctx.clone();
        clone.append("from the clone");

        let entries = ctx.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "from the clone");
    }

    #[test]
    fn should_keep_correlation_id_across_clones() {
        let ctx = LogContext::new();
        assert_eq!(ctx.correlation_id(), ctx.clone().correlation_id());
    }

    #[test]
    fn should_transfer_entries_in_order() {
        let sink = LogContext::new();
        let caller = LogContext::new();
        caller.append("before the call");
        sink.append("first");
        sink.append("second");

        sink.transfer_to(&caller);

        let messages: Vec<_> = caller
            .entries()
            .into_iter()
            .map(|entry| entry.message)
            .collect();
        assert_eq!(messages, ["before the call", "first", "second"]);
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn should_ignore_transfer_to_self() {
        let ctx = LogContext::new();
        ctx.append("kept");
        ctx.transfer_to(&ctx.clone());
        assert_eq!(ctx.entries().len(), 1);
    }
}

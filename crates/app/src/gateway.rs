//! Module registry and external request gateway.
//!
//! Every feature module registers a slot here at bootstrap. Other modules
//! call into it through an [`ExternalHandle`] — the sole cross-module call
//! primitive. A call made before the target module finished initializing is
//! appended to the module's FIFO queue and replayed, in the order it was
//! issued, once [`ModuleGateway::init`] runs.
//!
//! The gateway is an explicit value owned by the process bootstrap and
//! shared by reference; tests construct isolated gateways per case.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use tokio::sync::oneshot;

use hearth_domain::error::HearthError;
use hearth_domain::log::LogContext;

type QueuedInvoke = Box<dyn FnOnce(LogContext) -> BoxFuture<'static, ()> + Send>;

/// One call issued before the target module was ready.
///
/// `invoke` runs the original request and delivers its result to the caller
/// through a oneshot channel; it is consumed exactly once, during drain.
struct QueuedCall {
    invoke: QueuedInvoke,
    caller: LogContext,
}

struct ModuleSlot {
    requires_init: bool,
    initialized: bool,
    queue: Vec<QueuedCall>,
}

impl ModuleSlot {
    fn is_ready(&self) -> bool {
        !self.requires_init || self.initialized
    }
}

/// Registry of module slots plus their deferred-call queues.
#[derive(Default)]
pub struct ModuleGateway {
    modules: Mutex<HashMap<String, ModuleSlot>>,
}

impl ModuleGateway {
    /// Create an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a module slot.
    ///
    /// Modules that don't require initialization accept external calls
    /// immediately. Registering the same name twice keeps the existing slot
    /// (and its queue) untouched.
    pub fn register(&self, name: impl Into<String>, requires_init: bool) {
        let mut modules = self.modules.lock().expect("gateway lock poisoned");
        modules.entry(name.into()).or_insert(ModuleSlot {
            requires_init,
            initialized: false,
            queue: Vec::new(),
        });
    }

    /// Build a facade for calling into `name` on behalf of `ctx`.
    ///
    /// `source` names the call site for correlation (e.g.
    /// `"scene.EXTERNAL"`).
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::UnknownModule`] when `name` was never
    /// registered.
    pub fn external(
        self: &Arc<Self>,
        name: &str,
        ctx: LogContext,
        source: impl Into<String>,
    ) -> Result<ExternalHandle, HearthError> {
        let modules = self.modules.lock().expect("gateway lock poisoned");
        if !modules.contains_key(name) {
            return Err(HearthError::UnknownModule {
                name: name.to_string(),
            });
        }
        Ok(ExternalHandle {
            gateway: Arc::clone(self),
            module: name.to_string(),
            source: source.into(),
            ctx,
        })
    }

    /// Mark `name` initialized, then drain its queue.
    ///
    /// Queued entries are awaited **sequentially, in enqueue order** — this
    /// preserves causal ordering across calls requested before the module
    /// was ready. Each entry delivers its own result (or error) to its
    /// original caller; a failing entry does not stop the drain. The queue
    /// is consumed by the drain, so a second `init` never redispatches
    /// completed entries.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::UnknownModule`] when `name` was never
    /// registered.
    pub async fn init(&self, name: &str) -> Result<(), HearthError> {
        let queue = {
            let mut modules = self.modules.lock().expect("gateway lock poisoned");
            let slot = modules
                .get_mut(name)
                .ok_or_else(|| HearthError::UnknownModule {
                    name: name.to_string(),
                })?;
            slot.initialized = true;
            std::mem::take(&mut slot.queue)
        };

        if !queue.is_empty() {
            tracing::debug!(module = name, queued = queue.len(), "draining module queue");
        }
        for call in queue {
            (call.invoke)(call.caller).await;
        }
        Ok(())
    }
}

/// Per-module facade used by other modules to call into it.
///
/// Cheap to clone; carries the caller's [`LogContext`] so deferred work
/// stays attributable to the originating request.
#[derive(Clone)]
pub struct ExternalHandle {
    gateway: Arc<ModuleGateway>,
    module: String,
    source: String,
    ctx: LogContext,
}

impl ExternalHandle {
    /// The name of the module this handle calls into.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Run a request against the target module.
    ///
    /// The request receives a fresh sink [`LogContext`] followed by the
    /// caller's context. Whatever it appends to the sink is moved into the
    /// caller's context once the call finishes — whether it ran immediately
    /// or much later from the queue.
    ///
    /// # Errors
    ///
    /// Errors returned by `request` propagate unchanged; the gateway never
    /// retries. [`HearthError::RequestDropped`] signals that the gateway was
    /// torn down while the request was still queued.
    pub async fn run_request<T, F, Fut>(&self, request: F) -> Result<T, HearthError>
    where
        F: FnOnce(LogContext, LogContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, HearthError>> + Send + 'static,
        T: Send + 'static,
    {
        // Either the request comes straight back (module ready) or it went
        // into the queue and we wait on its oneshot.
        enum Routed<F, T> {
            Ready(F),
            Queued(oneshot::Receiver<Result<T, HearthError>>),
        }

        let routed = {
            let mut modules = self.gateway.modules.lock().expect("gateway lock poisoned");
            let slot =
                modules
                    .get_mut(&self.module)
                    .ok_or_else(|| HearthError::UnknownModule {
                        name: self.module.clone(),
                    })?;
            if slot.is_ready() {
                Routed::Ready(request)
            } else {
                let (tx, rx) = oneshot::channel();
                let source = self.source.clone();
                slot.queue.push(QueuedCall {
                    invoke: Box::new(move |caller| {
                        Box::pin(async move {
                            let result = dispatch(request, caller, &source).await;
                            let _ = tx.send(result);
                        })
                    }),
                    caller: self.ctx.clone(),
                });
                tracing::debug!(
                    module = %self.module,
                    source = %self.source,
                    "module not ready, request queued"
                );
                Routed::Queued(rx)
            }
        };

        match routed {
            Routed::Ready(request) => dispatch(request, self.ctx.clone(), &self.source).await,
            Routed::Queued(rx) => rx.await.map_err(|_| HearthError::RequestDropped)?,
        }
    }
}

/// Handle a single request: build the sink, run, move sink entries over.
async fn dispatch<T, F, Fut>(request: F, caller: LogContext, source: &str) -> Result<T, HearthError>
where
    F: FnOnce(LogContext, LogContext) -> Fut + Send,
    Fut: Future<Output = Result<T, HearthError>> + Send,
{
    tracing::debug!(source, "handling external request");
    let sink = LogContext::new();
    let result = request(sink.clone(), caller.clone()).await;
    sink.transfer_to(&caller);
    result
}

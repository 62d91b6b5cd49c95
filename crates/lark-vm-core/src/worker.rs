//! Workers
//!
//! A worker is one independent execution unit: its own global object,
//! call depth and active domain. Workers on different threads share state
//! only through domains and their memory.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use tracing::debug;

use crate::config::EngineConfig;
use crate::context::{ExecutionContext, ScopeChain};
use crate::domain::Domain;
use crate::error::{VmError, VmResult};
use crate::loader::{ActionStreamLoader, CodeLoader};
use crate::object::{ObjectRef, ScriptObject};
use crate::stage::{NullStage, Stage};
use crate::value::Value;

static NEXT_WORKER_ID: AtomicUsize = AtomicUsize::new(0);

/// An execution unit with its own object-model root
pub struct Worker {
    id: usize,
    config: EngineConfig,
    global: ObjectRef,
    root_domain: Arc<Domain>,
    active_domain: RwLock<Arc<Domain>>,
    stage: Arc<dyn Stage>,
    loader: Arc<dyn CodeLoader>,
    call_depth: AtomicUsize,
    started: Instant,
}

impl Worker {
    /// Worker with default configuration
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start building a worker
    pub fn builder() -> WorkerBuilder {
        WorkerBuilder::default()
    }

    /// Worker id, unique within the process
    pub fn id(&self) -> usize {
        self.id
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Global object (`_global`)
    pub fn global(&self) -> &ObjectRef {
        &self.global
    }

    /// Domain the worker was created with
    pub fn root_domain(&self) -> &Arc<Domain> {
        &self.root_domain
    }

    /// Domain active for code running on this worker
    pub fn current_domain(&self) -> Arc<Domain> {
        self.active_domain.read().clone()
    }

    /// Timeline capability
    pub fn stage(&self) -> &dyn Stage {
        self.stage.as_ref()
    }

    /// Code loader used by dynamic loading
    pub fn loader(&self) -> &dyn CodeLoader {
        self.loader.as_ref()
    }

    /// Milliseconds since the worker started
    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Context for top-level code: global scope, `this` is the root
    pub fn top_level_context(&self) -> ExecutionContext {
        let this = self
            .stage
            .root()
            .unwrap_or_else(|| Arc::clone(&self.global));
        ExecutionContext::new(ScopeChain::new(Arc::clone(&self.global)), Value::Object(this))
    }

    /// Run `f` with `domain` active, restoring the previous domain
    /// afterwards whatever `f` returns.
    pub fn with_domain<R>(&self, domain: Arc<Domain>, f: impl FnOnce() -> R) -> R {
        let previous = std::mem::replace(&mut *self.active_domain.write(), domain);
        debug!(
            worker = self.id,
            from = previous.id(),
            to = self.active_domain.read().id(),
            "domain swapped"
        );
        let _restore = scopeguard::guard(previous, |previous| {
            debug!(worker = self.id, to = previous.id(), "domain restored");
            *self.active_domain.write() = previous;
        });
        f()
    }

    /// Compare-and-swap on the active domain's memory
    pub fn compare_and_swap_i32(&self, addr: usize, expected: i32, new: i32) -> VmResult<i32> {
        self.current_domain()
            .compare_and_swap_i32(addr, expected, new)
    }

    /// Account for one nested call; the returned guard releases it
    pub fn enter_call(&self) -> VmResult<CallGuard<'_>> {
        let depth = self.call_depth.fetch_add(1, Ordering::SeqCst) + 1;
        let guard = CallGuard { worker: self };
        if depth > self.config.max_call_depth {
            return Err(VmError::StackOverflow);
        }
        Ok(guard)
    }

    /// Current call depth
    pub fn call_depth(&self) -> usize {
        self.call_depth.load(Ordering::SeqCst)
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("root_domain", &self.root_domain.id())
            .finish()
    }
}

/// Releases one level of call depth on drop
pub struct CallGuard<'w> {
    worker: &'w Worker,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.worker.call_depth.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Builder for [`Worker`]
#[derive(Default)]
pub struct WorkerBuilder {
    config: EngineConfig,
    domain: Option<Arc<Domain>>,
    stage: Option<Arc<dyn Stage>>,
    loader: Option<Arc<dyn CodeLoader>>,
}

impl WorkerBuilder {
    /// Engine configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Root domain, e.g. one shared with other workers
    pub fn domain(mut self, domain: Arc<Domain>) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Timeline capability
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Code loader
    pub fn loader(mut self, loader: Arc<dyn CodeLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Create the worker
    pub fn build(self) -> Worker {
        let root_domain = self.domain.unwrap_or_else(Domain::new_root);
        let id = NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed);
        debug!(worker = id, domain = root_domain.id(), "worker created");
        Worker {
            id,
            config: self.config,
            global: ScriptObject::new("global", None),
            active_domain: RwLock::new(Arc::clone(&root_domain)),
            root_domain,
            stage: self.stage.unwrap_or_else(|| Arc::new(NullStage)),
            loader: self.loader.unwrap_or_else(|| Arc::new(ActionStreamLoader)),
            call_depth: AtomicUsize::new(0),
            started: Instant::now(),
        }
    }
}

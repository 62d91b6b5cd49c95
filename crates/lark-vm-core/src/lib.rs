//! # Lark VM Core
//!
//! Execution engine for AVM1 action streams.
//!
//! ## Design Principles
//!
//! - **Explicit context**: the worker and its active domain are passed to
//!   every call, there is no ambient global state
//! - **Single-threaded execution**: an execution context never leaves its
//!   worker; workers share only domains and their memory
//! - **Atomic domain memory**: compare-and-swap is the one cross-worker
//!   serialization point
//! - **Capabilities at the edges**: timeline and loading are traits the
//!   embedder supplies

#![warn(clippy::all)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod byte_array;
pub mod closure;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod interpreter;
pub mod loader;
pub mod object;
pub mod stage;
pub mod tag;
pub mod value;
pub mod worker;

pub use byte_array::ByteArray;
pub use closure::{Closure, ClosureKind};
pub use config::EngineConfig;
pub use context::{ExecutionContext, REGISTER_COUNT, ScopeChain};
pub use domain::{Domain, MIN_DOMAIN_MEMORY_LIMIT};
pub use error::{VmError, VmResult};
pub use interpreter::{Flow, Interpreter};
pub use loader::{ActionStreamLoader, CodeLoader, load_into_domain};
pub use object::{Callable, NativeData, NativeFunction, ObjectRef, Property, ScriptObject};
pub use stage::{NullStage, Stage};
pub use tag::{ButtonActions, DoActionTag, DoInitActionTag, ExecutableTag};
pub use value::Value;
pub use worker::{CallGuard, Worker, WorkerBuilder};

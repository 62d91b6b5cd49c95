//! Dynamic code loading
//!
//! [`CodeLoader`] is the hand-off point for bytes fetched at run time. The
//! default loader treats them as an action stream; an embedder with a
//! newer bytecode interpreter installs its own.

use std::io::{Cursor, Read};
use std::sync::Arc;

use lark_vm_bytecode::decode_actions;
use tracing::debug;

use crate::domain::Domain;
use crate::error::{VmError, VmResult};
use crate::interpreter::Interpreter;
use crate::value::Value;
use crate::worker::Worker;

/// Loads and executes a byte stream on a worker
pub trait CodeLoader: Send + Sync {
    /// Read `stream` to the end and execute it
    fn load(&self, worker: &Worker, stream: &mut dyn Read, version: u32) -> VmResult<Value>;
}

/// Runs the stream as a `DoAction` body against the global scope
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionStreamLoader;

impl CodeLoader for ActionStreamLoader {
    fn load(&self, worker: &Worker, stream: &mut dyn Read, version: u32) -> VmResult<Value> {
        let mut bytes = Vec::new();
        stream
            .read_to_end(&mut bytes)
            .map_err(|e| VmError::Io(e.to_string()))?;
        debug!(
            worker = worker.id(),
            len = bytes.len(),
            version,
            domain = worker.current_domain().id(),
            "loading action stream"
        );
        let block = decode_actions(&bytes)?;
        let mut ctx = worker.top_level_context();
        Interpreter::new(worker).run(&mut ctx, &block)
    }
}

/// Execute `bytes` with `domain` active on `worker`.
///
/// The worker's previous domain is restored whether loading succeeds or
/// fails.
pub fn load_into_domain(
    worker: &Worker,
    domain: Arc<Domain>,
    bytes: &[u8],
    version: u32,
) -> VmResult<Value> {
    worker.with_domain(domain, || {
        let mut cursor = Cursor::new(bytes);
        worker.loader().load(worker, &mut cursor, version)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lark_vm_bytecode::{ActionCode, ActionStreamBuilder};

    #[test]
    fn test_loaded_code_sees_target_domain_then_restores() {
        struct Probe;
        impl CodeLoader for Probe {
            fn load(&self, worker: &Worker, _: &mut dyn Read, _: u32) -> VmResult<Value> {
                Ok(Value::Number(worker.current_domain().id() as f64))
            }
        }
        let worker = Worker::builder().loader(Arc::new(Probe)).build();
        let original = worker.current_domain();
        let target = Domain::new_child(&original);
        let seen = load_into_domain(&worker, target.clone(), &[], 10).unwrap();
        assert_eq!(seen, Value::Number(target.id() as f64));
        assert!(Arc::ptr_eq(&worker.current_domain(), &original));
    }

    #[test]
    fn test_truncated_stream_fails_and_restores() {
        let worker = Worker::new();
        let original = worker.current_domain();
        let mut bytes = ActionStreamBuilder::new().push_int(1).into_body();
        bytes.truncate(bytes.len() - 2);
        let err = load_into_domain(&worker, Domain::new_root(), &bytes, 10).unwrap_err();
        assert!(matches!(err, VmError::Decode(_)));
        assert!(Arc::ptr_eq(&worker.current_domain(), &original));
    }

    #[test]
    fn test_action_stream_loader_runs_against_global() {
        let worker = Worker::new();
        let bytes = ActionStreamBuilder::new()
            .push_str("loaded")
            .push_int(1)
            .action(ActionCode::SetVariable)
            .finish();
        load_into_domain(&worker, Domain::new_root(), &bytes, 10).unwrap();
        assert_eq!(worker.global().get_own_value("loaded"), Some(Value::Integer(1)));
    }
}

//! Installation of the host surface into a worker

use std::sync::Arc;

use lark_vm_core::{ByteArray, ObjectRef, ScriptObject, Value, Worker};
use tracing::debug;

use crate::capabilities::Capabilities;
use crate::config::HostConfig;
use crate::domain::domain_class;
use crate::file::File;
use crate::io::{FsHostIo, HostIo};
use crate::native::{Args, define_method};
use crate::system::system_object;

/// Largest `ByteArray` a script may allocate
const MAX_SCRIPT_BYTE_ARRAY: u32 = 1 << 30;

/// Host services shared by every worker it is installed into
#[derive(Clone)]
pub struct Host {
    io: Arc<dyn HostIo>,
    config: HostConfig,
}

impl Host {
    /// Host over `io` with a default config
    pub fn new(io: Arc<dyn HostIo>) -> Self {
        Self {
            io,
            config: HostConfig::default(),
        }
    }

    /// File-system host limited to `caps`
    pub fn with_capabilities(caps: Capabilities) -> Self {
        Self::new(Arc::new(FsHostIo::new(caps)))
    }

    /// Replace the config
    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    /// Injected I/O
    pub fn io(&self) -> &Arc<dyn HostIo> {
        &self.io
    }

    /// Active config
    pub fn host_config(&self) -> &HostConfig {
        &self.config
    }
}

/// Define `avmplus` (`File`, `System`, `Domain`), `ByteArray` and `casi32`
/// on the worker's global object. Returns the `avmplus` object.
pub fn install(worker: &Worker, host: &Host) -> ObjectRef {
    let avmplus = ScriptObject::new("avmplus", None);
    avmplus.define(
        "File",
        Value::Object(File::new(Arc::clone(&host.io)).into_script_object()),
    );
    avmplus.define("System", Value::Object(system_object(&host.config)));
    avmplus.define("Domain", Value::Object(domain_class(Arc::clone(&host.io))));

    let global = worker.global();
    global.define("avmplus", Value::Object(Arc::clone(&avmplus)));
    global.define("ByteArray", Value::Object(byte_array_class()));
    define_method(global, "casi32", |worker, _, args| {
        let args = Args::new("casi32", args).expect(3, 3)?;
        let previous = worker.compare_and_swap_i32(
            args.get(0).to_u32() as usize,
            args.get(1).to_i32(),
            args.get(2).to_i32(),
        )?;
        Ok(Value::Integer(previous))
    });

    debug!(worker = worker.id(), "host surface installed");
    avmplus
}

/// `new ByteArray(length)`: zero-filled, fixed length
fn byte_array_class() -> ObjectRef {
    ScriptObject::native_function(|_, _, args| {
        let args = Args::new("ByteArray", args).expect(0, 1)?;
        let len = args.u32_or(0, 0).min(MAX_SCRIPT_BYTE_ARRAY) as usize;
        Ok(Value::Object(ScriptObject::byte_array(Arc::new(
            ByteArray::new(len),
        ))))
    })
}

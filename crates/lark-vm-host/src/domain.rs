//! `avmplus.Domain`
//!
//! Script-side wrapper over [`lark_vm_core::Domain`]. Instances carry the
//! domain as their native payload; loading runs code with the target domain
//! active on the calling worker.

use std::sync::Arc;

use lark_vm_core::{
    Domain, MIN_DOMAIN_MEMORY_LIMIT, NativeData, ObjectRef, ScriptObject, Value, VmError,
    VmResult, Worker, load_into_domain,
};
use tracing::warn;

use crate::io::HostIo;
use crate::native::{Args, define_getter, define_method, native};

fn wrap(proto: &ObjectRef, domain: Arc<Domain>) -> Value {
    Value::Object(ScriptObject::with_native(
        "Domain",
        Some(Arc::clone(proto)),
        NativeData::Domain(domain),
    ))
}

fn this_domain(this: &Value) -> VmResult<Arc<Domain>> {
    this.as_object()
        .and_then(|obj| obj.as_domain().cloned())
        .ok_or_else(|| VmError::type_error(format!("{} is not a Domain", this.type_of())))
}

/// `Domain.load`: read `path` through `io` and run it in `domain`
pub fn load(
    worker: &Worker,
    io: &dyn HostIo,
    domain: Arc<Domain>,
    path: &str,
    version: u32,
) -> VmResult<Value> {
    if version != 0 {
        warn!(version, "avmplus.Domain.load is not implemented for this swfVersion");
    }
    if !io.exists(path) {
        return Err(VmError::FileOpen(path.to_string()));
    }
    let bytes = io.read_bytes(path)?;
    load_into_domain(worker, domain, &bytes, version)
}

/// `Domain.loadBytes`: run `bytes` in `domain`
pub fn load_bytes(
    worker: &Worker,
    domain: Arc<Domain>,
    bytes: &[u8],
    version: u32,
) -> VmResult<Value> {
    if version != 0 {
        warn!(version, "avmplus.Domain.loadBytes ignores swfVersion");
    }
    load_into_domain(worker, domain, bytes, version)
}

/// `Domain.getClass`: the domain chain first, then the worker's globals
pub fn get_class(worker: &Worker, domain: &Domain, name: &str) -> VmResult<Value> {
    if let Some(class) = domain.get_class(name) {
        return Ok(class);
    }
    let global = worker.global();
    if global.has_property(name) {
        return global.get(worker, name);
    }
    Err(VmError::reference_error(format!("Variable {name} is not defined")))
}

/// Build the `Domain` constructor with its statics and prototype
pub fn domain_class(io: Arc<dyn HostIo>) -> ObjectRef {
    let proto = ScriptObject::new("Object", None);

    // ==================== Instance members ====================

    let loader_io = Arc::clone(&io);
    define_method(&proto, "load", move |worker, this, args| {
        let args = Args::new("load", args).expect(1, 2)?;
        load(
            worker,
            loader_io.as_ref(),
            this_domain(this)?,
            &args.string(0),
            args.u32_or(1, 0),
        )
    });
    define_method(&proto, "loadBytes", |worker, this, args| {
        let args = Args::new("loadBytes", args).expect(1, 2)?;
        let bytes = args.byte_array(0)?.to_vec();
        load_bytes(worker, this_domain(this)?, &bytes, args.u32_or(1, 0))
    });
    define_method(&proto, "getClass", |worker, this, args| {
        let args = Args::new("getClass", args).expect(1, 1)?;
        get_class(worker, &*this_domain(this)?, &args.string(0))
    });
    proto.define_accessor(
        "domainMemory",
        Some(native(|_, this, _| {
            Ok(this_domain(this)?
                .domain_memory()
                .map_or(Value::Null, |m| Value::Object(ScriptObject::byte_array(m))))
        })),
        Some(native(|_, this, args| {
            let memory = Args::new("domainMemory", args).optional_byte_array(0)?;
            this_domain(this)?.set_domain_memory(memory)?;
            Ok(Value::Undefined)
        })),
    );

    // ==================== Constructor and statics ====================

    let ctor_proto = Arc::clone(&proto);
    let ctor = ScriptObject::native_function(move |worker, _, args| {
        let args = Args::new("Domain", args).expect(0, 1)?;
        let domain = match args.optional_domain(0)? {
            None => worker.current_domain(),
            Some(parent) => Domain::new_child(&parent),
        };
        Ok(wrap(&ctor_proto, domain))
    });
    ctor.define("prototype", Value::Object(Arc::clone(&proto)));

    let current_proto = Arc::clone(&proto);
    define_getter(&ctor, "currentDomain", move |worker, _, _| {
        Ok(wrap(&current_proto, worker.current_domain()))
    });
    define_getter(&ctor, "MIN_DOMAIN_MEMORY_LENGTH", |_, _, _| {
        Ok(Value::Integer(MIN_DOMAIN_MEMORY_LIMIT as i32))
    });

    ctor
}

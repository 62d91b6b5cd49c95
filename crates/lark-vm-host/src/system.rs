//! `avmplus.System`
//!
//! Several members are placeholders in the player too; they log once per
//! call and return a benign default.

use std::time::Duration;

use lark_vm_core::{ObjectRef, ScriptObject, Value, VmResult, Worker};
use tracing::{debug, warn};

use crate::config::HostConfig;
use crate::native::{Args, define_getter, define_method};

/// Value reported by the memory statistics getters
pub const STUB_MEMORY_BYTES: u32 = 1024;

fn not_implemented(name: &str) {
    warn!("avmplus.System.{name} is not implemented");
}

/// `System.canonicalizeNumber`: numeric-like values become numbers, names
/// become `NaN`, anything else is returned as is.
pub fn canonicalize_number(value: &Value) -> Value {
    match value {
        Value::Undefined | Value::Null | Value::Boolean(_) | Value::Integer(_) | Value::Number(_) => {
            Value::Number(value.to_number())
        }
        Value::Object(obj) if matches!(obj.class_name(), "QName" | "Namespace") => {
            Value::Number(f64::NAN)
        }
        other => other.clone(),
    }
}

/// Build the `System` object
pub fn system_object(config: &HostConfig) -> ObjectRef {
    let obj = ScriptObject::new("System", None);

    define_method(&obj, "getFeatures", |_, _, _| {
        not_implemented("getFeatures");
        Ok(Value::string(""))
    });
    define_method(&obj, "getRunmode", |worker, _, _| {
        Ok(Value::string(worker.config().run_mode()))
    });
    for name in ["queueCollection", "forceFullCollection", "pauseForGCIfCollectionImminent"] {
        define_method(&obj, name, move |_, _, _| {
            not_implemented(name);
            Ok(Value::Undefined)
        });
    }
    define_method(&obj, "getAvmplusVersion", |_, _, _| {
        not_implemented("getAvmplusVersion");
        Ok(Value::string("0"))
    });

    let debugger = config.debugger;
    define_method(&obj, "isDebugger", move |_, _, _| Ok(Value::Boolean(debugger)));
    define_method(&obj, "isGlobal", |_, _, _| {
        not_implemented("isGlobal");
        Ok(Value::Boolean(false))
    });

    for name in ["freeMemory", "totalMemory", "privateMemory"] {
        define_getter(&obj, name, move |_, _, _| {
            not_implemented(name);
            Ok(Value::Number(STUB_MEMORY_BYTES as f64))
        });
    }
    define_getter(&obj, "swfVersion", |worker, _, _| {
        Ok(Value::Integer(worker.config().swf_version as i32))
    });
    let argv = config.argv.clone();
    define_getter(&obj, "argv", move |_, _, _| {
        Ok(Value::Object(ScriptObject::array(
            argv.iter().map(|a| Value::string(a.as_str())),
        )))
    });

    define_method(&obj, "exec", |_, _, args| {
        not_implemented("exec");
        Args::new("exec", args).at_least(1)?;
        Ok(Value::Undefined)
    });
    define_method(&obj, "write", |_, _, _| {
        not_implemented("write");
        Ok(Value::Undefined)
    });
    define_method(&obj, "sleep", |worker, _, args| {
        sleep(worker, Args::new("sleep", args).expect(1, 1)?.u32_or(0, 0))
    });
    define_method(&obj, "exit", |_, _, _| {
        not_implemented("exit");
        Ok(Value::Undefined)
    });
    define_method(&obj, "trace", |worker, _, args| {
        let message = args
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        worker.stage().trace(&message);
        Ok(Value::Undefined)
    });
    define_method(&obj, "canonicalizeNumber", |_, _, args| {
        let args = Args::new("canonicalizeNumber", args).expect(1, 1)?;
        Ok(canonicalize_number(&args.get(0)))
    });

    obj
}

/// Block the calling worker for `ms` milliseconds
fn sleep(worker: &Worker, ms: u32) -> VmResult<Value> {
    debug!(worker = worker.id(), ms, "sleeping");
    std::thread::sleep(Duration::from_millis(ms as u64));
    Ok(Value::Undefined)
}

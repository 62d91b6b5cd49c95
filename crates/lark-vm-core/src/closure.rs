//! Script functions
//!
//! A closure shares its decoded body with every invocation and captures
//! the scope chain and constant pool in effect where it was defined. Each
//! call runs in a fresh [`ExecutionContext`].

use std::sync::Arc;

use lark_vm_bytecode::{ActionBlock, FunctionDef, FunctionDef2, PreloadFlags, RegisterParam};
use tracing::debug;

use crate::context::{ExecutionContext, REGISTER_COUNT, ScopeChain};
use crate::error::VmResult;
use crate::interpreter::Interpreter;
use crate::object::ScriptObject;
use crate::value::Value;

/// Parameter binding scheme
#[derive(Debug, Clone)]
pub enum ClosureKind {
    /// `DefineFunction`: parameters are locals
    Simple {
        /// Parameter names
        params: Vec<String>,
    },
    /// `DefineFunction2`: parameters and well-known values in registers
    Registers {
        /// Declared register count
        register_count: u8,
        /// Preload/suppress flags
        flags: PreloadFlags,
        /// Parameters with optional registers
        params: Vec<RegisterParam>,
    },
}

/// A callable built from a function definition
#[derive(Debug)]
pub struct Closure {
    name: Option<String>,
    kind: ClosureKind,
    body: Arc<ActionBlock>,
    scope: ScopeChain,
    constants: Arc<[Arc<str>]>,
}

impl Closure {
    /// Closure for `DefineFunction`
    pub fn simple(def: &FunctionDef, scope: ScopeChain, constants: Arc<[Arc<str>]>) -> Self {
        Self {
            name: (!def.name.is_empty()).then(|| def.name.clone()),
            kind: ClosureKind::Simple {
                params: def.params.clone(),
            },
            body: Arc::new(def.body.clone()),
            scope,
            constants,
        }
    }

    /// Closure for `DefineFunction2`
    pub fn with_registers(
        def: &FunctionDef2,
        scope: ScopeChain,
        constants: Arc<[Arc<str>]>,
    ) -> Self {
        Self {
            name: (!def.name.is_empty()).then(|| def.name.clone()),
            kind: ClosureKind::Registers {
                register_count: def.register_count,
                flags: def.flags,
                params: def.params.clone(),
            },
            body: Arc::new(def.body.clone()),
            scope,
            constants,
        }
    }

    /// Function name; `None` for anonymous functions
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Binding scheme
    pub fn kind(&self) -> &ClosureKind {
        &self.kind
    }

    /// Decoded body
    pub fn body(&self) -> &ActionBlock {
        &self.body
    }

    /// Invoke with `this` and `args`.
    ///
    /// Returns the value of the body's `Return`, or `undefined`.
    pub fn call(&self, interp: &Interpreter<'_>, this: Value, args: &[Value]) -> VmResult<Value> {
        let worker = interp.worker();
        let _depth = worker.enter_call()?;

        let activation = ScriptObject::new("Activation", None);
        let mut scope = self.scope.clone();
        scope.push(Arc::clone(&activation));
        let mut ctx = ExecutionContext::new(scope, this.clone())
            .with_activation(Arc::clone(&activation))
            .with_constants(Arc::clone(&self.constants));

        let arguments = || Value::Object(ScriptObject::array(args.iter().cloned()));
        let arg = |i: usize| args.get(i).cloned().unwrap_or_default();

        match &self.kind {
            ClosureKind::Simple { params } => {
                for (i, name) in params.iter().enumerate() {
                    activation.define(name, arg(i));
                }
                activation.define("this", this);
                activation.define("arguments", arguments());
            }
            ClosureKind::Registers { flags, params, .. } => {
                let flags = *flags;
                let mut claimed = [false; REGISTER_COUNT];
                for (i, param) in params.iter().enumerate() {
                    match param.register {
                        Some(r) => {
                            if ctx.set_register(r as usize, arg(i)) {
                                claimed[r as usize] = true;
                            }
                        }
                        None => activation.define(&param.name, arg(i)),
                    }
                }

                let super_value = || super_of(&this);
                let preloads: [(bool, &str, &dyn Fn() -> Value); 6] = [
                    (flags.preload_this(), "this", &|| this.clone()),
                    (flags.preload_arguments(), "arguments", &arguments),
                    (flags.preload_super(), "super", &super_value),
                    (flags.preload_parent(), "_parent", &|| {
                        worker
                            .stage()
                            .parent_of(&this)
                            .map_or(Value::Undefined, Value::Object)
                    }),
                    (flags.preload_root(), "_root", &|| {
                        Value::Object(
                            worker
                                .stage()
                                .root()
                                .unwrap_or_else(|| Arc::clone(worker.global())),
                        )
                    }),
                    (flags.preload_global(), "_global", &|| {
                        Value::Object(Arc::clone(worker.global()))
                    }),
                ];
                let mut next = 1usize;
                for (enabled, what, value) in preloads {
                    if !enabled {
                        continue;
                    }
                    let register = next;
                    next += 1;
                    if claimed[register] {
                        debug!(register, what, "preload skipped, register already bound");
                        continue;
                    }
                    ctx.set_register(register, value());
                    claimed[register] = true;
                }

                if !flags.preload_this() && !flags.suppress_this() {
                    activation.define("this", this.clone());
                }
                if !flags.preload_arguments() && !flags.suppress_arguments() {
                    activation.define("arguments", arguments());
                }
                if !flags.preload_super() && !flags.suppress_super() {
                    activation.define("super", super_value());
                }
            }
        }

        interp.run(&mut ctx, &self.body)
    }
}

/// Superclass constructor recorded by `ActionExtends` on `this`'s prototype
fn super_of(this: &Value) -> Value {
    this.as_object()
        .and_then(|obj| obj.prototype())
        .and_then(|proto| proto.get_own_value("__constructor__"))
        .unwrap_or_default()
}

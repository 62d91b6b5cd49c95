//! Action interpreter
//!
//! Executes decoded action blocks against an [`ExecutionContext`]. Each
//! action reports whether the block continues or returns; branches are
//! recorded on the context and resolved against the block after the
//! action completes.

use std::sync::Arc;

use lark_vm_bytecode::{Action, ActionBlock, JumpTarget, PushValue};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::closure::Closure;
use crate::context::ExecutionContext;
use crate::error::{VmError, VmResult};
use crate::object::{Callable, ObjectRef, ScriptObject};
use crate::value::Value;
use crate::worker::Worker;

/// Outcome of executing one action
#[derive(Debug, Clone)]
pub enum Flow {
    /// Advance to the next record (or the pending branch target)
    Continue,
    /// `Return` executed; stop the block
    Return(Value),
}

type Args = SmallVec<[Value; 8]>;

/// Executes action blocks on behalf of a worker
pub struct Interpreter<'w> {
    worker: &'w Worker,
}

impl<'w> Interpreter<'w> {
    /// Interpreter bound to `worker`
    pub fn new(worker: &'w Worker) -> Self {
        Self { worker }
    }

    /// The worker this interpreter runs on
    pub fn worker(&self) -> &'w Worker {
        self.worker
    }

    /// Run `block` to completion and return the context's return value
    pub fn run(&self, ctx: &mut ExecutionContext, block: &ActionBlock) -> VmResult<Value> {
        match self.run_block(ctx, block)? {
            Flow::Return(value) => Ok(value),
            Flow::Continue => Ok(ctx.return_value().cloned().unwrap_or_default()),
        }
    }

    /// Main loop
    fn run_block(&self, ctx: &mut ExecutionContext, block: &ActionBlock) -> VmResult<Flow> {
        let mut ip = 0;
        while let Some(record) = block.get(ip) {
            trace!(
                worker = self.worker.id(),
                offset = record.offset,
                action = record.action.name(),
                "execute"
            );
            if let Flow::Return(value) = self.execute(ctx, &record.action)? {
                return Ok(Flow::Return(value));
            }
            match ctx.take_jump_offset() {
                None => ip += 1,
                Some(offset) => match block.resolve_jump(ip, offset) {
                    JumpTarget::Record(target) => ip = target,
                    JumpTarget::End => break,
                    JumpTarget::Invalid(target) => {
                        return Err(VmError::InvalidJump { offset: target });
                    }
                },
            }
        }
        Ok(Flow::Continue)
    }

    /// Execute a single action
    pub fn execute(&self, ctx: &mut ExecutionContext, action: &Action) -> VmResult<Flow> {
        let worker = self.worker;
        let stage = worker.stage();
        match action {
            // ==================== Timeline ====================
            Action::NextFrame => stage.next_frame(),
            Action::PreviousFrame => stage.previous_frame(),
            Action::Play => stage.play(),
            Action::Stop => stage.stop(),
            Action::ToggleQuality => stage.toggle_quality(),
            Action::StopSounds => stage.stop_sounds(),
            Action::GotoFrame(frame) => stage.goto_frame(*frame as u32, false),
            Action::GotoFrame2 { play, scene_bias } => {
                let frame = ctx.pop();
                match &frame {
                    Value::String(label) if label.parse::<f64>().is_err() => {
                        stage.goto_label(label, *play)
                    }
                    other => {
                        let frame = other.to_u32().saturating_sub(1)
                            + scene_bias.unwrap_or(0) as u32;
                        stage.goto_frame(frame, *play);
                    }
                }
            }
            Action::GoToLabel(label) => stage.goto_label(label, false),
            Action::GetUrl { url, target } => stage.get_url(url, target, 0),
            Action::GetUrl2 { flags } => {
                let target = ctx.pop().to_string();
                let url = ctx.pop().to_string();
                stage.get_url(&url, &target, *flags);
            }
            Action::GetProperty => {
                let index = ctx.pop().to_u32();
                let target = ctx.pop().to_string();
                ctx.push(stage.get_property(&target, index));
            }
            Action::SetProperty => {
                let value = ctx.pop();
                let index = ctx.pop().to_u32();
                let target = ctx.pop().to_string();
                stage.set_property(&target, index, value);
            }
            Action::CloneSprite => {
                let depth = ctx.pop().to_i32();
                let target = ctx.pop().to_string();
                let source = ctx.pop().to_string();
                stage.clone_sprite(&source, &target, depth);
            }
            Action::RemoveSprite => {
                let target = ctx.pop().to_string();
                stage.remove_sprite(&target);
            }
            Action::Call => {
                let frame = ctx.pop();
                stage.call_frame(&frame);
            }
            Action::Trace => {
                let message = ctx.pop().to_string();
                stage.trace(&message);
            }
            Action::GetTime => ctx.push(Value::Number(worker.elapsed_ms().floor())),

            // ==================== Stack ====================
            Action::Push(values) => {
                for value in values {
                    let value = self.push_value(ctx, value);
                    ctx.push(value);
                }
            }
            Action::Pop => {
                ctx.pop();
            }
            Action::PushDuplicate => {
                let top = ctx.peek();
                ctx.push(top);
            }
            Action::StackSwap => {
                let a = ctx.pop();
                let b = ctx.pop();
                ctx.push(a);
                ctx.push(b);
            }
            Action::StoreRegister(register) => {
                let top = ctx.peek();
                ctx.set_register(*register as usize, top);
            }
            Action::ConstantPool(pool) => ctx.set_constants(pool),

            // ==================== Arithmetic ====================
            Action::Add => self.binary_number(ctx, |b, a| b + a),
            Action::Subtract => self.binary_number(ctx, |b, a| b - a),
            Action::Multiply => self.binary_number(ctx, |b, a| b * a),
            Action::Divide => self.binary_number(ctx, |b, a| b / a),
            Action::Modulo => self.binary_number(ctx, |b, a| b % a),
            Action::Add2 => {
                let a = ctx.pop();
                let b = ctx.pop();
                let stringy = |v: &Value| matches!(v, Value::String(_) | Value::Object(_));
                if stringy(&a) || stringy(&b) {
                    ctx.push(Value::string(format!("{b}{a}")));
                } else {
                    ctx.push(Value::Number(b.to_number() + a.to_number()));
                }
            }
            Action::Increment => {
                let n = ctx.pop().to_number();
                ctx.push(Value::Number(n + 1.0));
            }
            Action::Decrement => {
                let n = ctx.pop().to_number();
                ctx.push(Value::Number(n - 1.0));
            }
            Action::BitAnd => self.binary_i32(ctx, |b, a| b & a),
            Action::BitOr => self.binary_i32(ctx, |b, a| b | a),
            Action::BitXor => self.binary_i32(ctx, |b, a| b ^ a),
            Action::BitLShift => self.binary_i32(ctx, |b, a| b.wrapping_shl(a as u32 & 31)),
            Action::BitRShift => self.binary_i32(ctx, |b, a| b.wrapping_shr(a as u32 & 31)),
            Action::BitURShift => {
                let shift = ctx.pop().to_u32() & 31;
                let value = ctx.pop().to_u32();
                ctx.push(Value::Number((value >> shift) as f64));
            }

            // ==================== Comparison ====================
            Action::Equals => {
                let a = ctx.pop().to_number();
                let b = ctx.pop().to_number();
                ctx.push(Value::Boolean(b == a));
            }
            Action::Less => {
                let a = ctx.pop().to_number();
                let b = ctx.pop().to_number();
                ctx.push(Value::Boolean(b < a));
            }
            Action::Equals2 => {
                let a = ctx.pop();
                let b = ctx.pop();
                ctx.push(Value::Boolean(b.loose_eq(&a)));
            }
            Action::StrictEquals => {
                let a = ctx.pop();
                let b = ctx.pop();
                ctx.push(Value::Boolean(b.strict_eq(&a)));
            }
            Action::Less2 => {
                let a = ctx.pop();
                let b = ctx.pop();
                ctx.push(less_than(&b, &a));
            }
            Action::Greater => {
                let a = ctx.pop();
                let b = ctx.pop();
                ctx.push(less_than(&a, &b));
            }
            Action::And => {
                let a = ctx.pop().to_boolean();
                let b = ctx.pop().to_boolean();
                ctx.push(Value::Boolean(b && a));
            }
            Action::Or => {
                let a = ctx.pop().to_boolean();
                let b = ctx.pop().to_boolean();
                ctx.push(Value::Boolean(b || a));
            }
            Action::Not => {
                let a = ctx.pop().to_boolean();
                ctx.push(Value::Boolean(!a));
            }

            // ==================== Strings ====================
            Action::StringAdd => {
                let a = ctx.pop();
                let b = ctx.pop();
                ctx.push(Value::string(format!("{b}{a}")));
            }
            Action::StringEquals => self.binary_string(ctx, |b, a| b == a),
            Action::StringLess => self.binary_string(ctx, |b, a| b < a),
            Action::StringGreater => self.binary_string(ctx, |b, a| b > a),
            Action::StringLength | Action::MbStringLength => {
                let s = ctx.pop().to_string();
                ctx.push(Value::Integer(s.chars().count() as i32));
            }
            Action::StringExtract | Action::MbStringExtract => {
                let count = ctx.pop().to_integer();
                let index = ctx.pop().to_integer();
                let s = ctx.pop().to_string();
                ctx.push(Value::string(substring(&s, index, count)));
            }
            Action::CharToAscii | Action::MbCharToAscii => {
                let s = ctx.pop().to_string();
                ctx.push(match s.chars().next() {
                    Some(c) => Value::Integer(c as i32),
                    None => Value::Number(f64::NAN),
                });
            }
            Action::AsciiToChar | Action::MbAsciiToChar => {
                let code = ctx.pop().to_u32();
                let s = match char::from_u32(code) {
                    Some('\0') | None => String::new(),
                    Some(c) => c.to_string(),
                };
                ctx.push(Value::string(s));
            }

            // ==================== Coercion and types ====================
            Action::ToNumber => {
                let n = ctx.pop().to_number();
                ctx.push(Value::Number(n));
            }
            Action::ToString => {
                let s = ctx.pop().to_string();
                ctx.push(Value::string(s));
            }
            Action::ToInteger => {
                let n = ctx.pop().to_integer();
                ctx.push(Value::Number(n));
            }
            Action::TypeOf => {
                let v = ctx.pop();
                ctx.push(Value::string(v.type_of()));
            }
            Action::InstanceOf => {
                let ctor = ctx.pop();
                let value = ctx.pop();
                let result = self.instance_of(&value, &ctor)?;
                ctx.push(Value::Boolean(result));
            }
            Action::CastOp => {
                let value = ctx.pop();
                let ctor = ctx.pop();
                if self.instance_of(&value, &ctor)? {
                    ctx.push(value);
                } else {
                    ctx.push(Value::Null);
                }
            }
            Action::ImplementsOp => {
                let ctor = ctx.pop();
                let interfaces: Vec<ObjectRef> = pop_args(ctx)
                    .into_iter()
                    .filter_map(|v| v.as_object().cloned())
                    .collect();
                if let Some(ctor) = ctor.as_object()
                    && let Value::Object(proto) = ctor.get(worker, "prototype")?
                {
                    proto.set_interfaces(interfaces);
                }
            }
            Action::Extends => {
                let superclass = ctx.pop();
                let subclass = ctx.pop();
                match (subclass.as_object(), superclass.as_object()) {
                    (Some(sub), Some(sup)) => {
                        let super_proto = sup.get(worker, "prototype")?;
                        let proto = ScriptObject::new("Object", super_proto.as_object().cloned());
                        proto.define("__constructor__", superclass.clone());
                        sub.set(worker, "prototype", Value::Object(proto))?;
                    }
                    _ => debug!("extends on a non-object ignored"),
                }
            }

            // ==================== Variables and members ====================
            Action::GetVariable => {
                let name = ctx.pop().to_string();
                let value = self.get_variable(ctx, &name)?;
                ctx.push(value);
            }
            Action::SetVariable => {
                let value = ctx.pop();
                let name = ctx.pop().to_string();
                self.set_variable(ctx, &name, value)?;
            }
            Action::DefineLocal => {
                let value = ctx.pop();
                let name = ctx.pop().to_string();
                ctx.local_scope().define(&name, value);
            }
            Action::DefineLocal2 => {
                let name = ctx.pop().to_string();
                let local = ctx.local_scope();
                if local.get_own(&name).is_none() {
                    local.define(&name, Value::Undefined);
                }
            }
            Action::Delete => {
                let name = ctx.pop().to_string();
                let target = ctx.pop();
                let deleted = target.as_object().is_some_and(|obj| obj.delete(&name));
                ctx.push(Value::Boolean(deleted));
            }
            Action::Delete2 => {
                let name = ctx.pop().to_string();
                let deleted = ctx
                    .scope()
                    .iter()
                    .find(|scope| scope.get_own(&name).is_some())
                    .is_some_and(|scope| scope.delete(&name));
                ctx.push(Value::Boolean(deleted));
            }
            Action::GetMember => {
                let name = ctx.pop().to_string();
                let target = ctx.pop();
                let value = self.get_member(&target, &name)?;
                ctx.push(value);
            }
            Action::SetMember => {
                let value = ctx.pop();
                let name = ctx.pop().to_string();
                let target = ctx.pop();
                self.set_member(&target, &name, value)?;
            }
            Action::Enumerate => {
                let name = ctx.pop().to_string();
                let target = self.get_variable(ctx, &name)?;
                push_enumeration(ctx, &target);
            }
            Action::Enumerate2 => {
                let target = ctx.pop();
                push_enumeration(ctx, &target);
            }

            // ==================== Objects and calls ====================
            Action::NewObject => {
                let name = ctx.pop().to_string();
                let args = pop_args(ctx);
                let ctor = self.get_variable(ctx, &name)?;
                let result = self.construct(&ctor, &args)?;
                ctx.push(result);
            }
            Action::NewMethod => {
                let method = ctx.pop();
                let target = ctx.pop();
                let args = pop_args(ctx);
                let ctor = match method_name(&method) {
                    None => target,
                    Some(name) => self.get_member(&target, &name)?,
                };
                let result = self.construct(&ctor, &args)?;
                ctx.push(result);
            }
            Action::InitArray => {
                let values = pop_args(ctx);
                ctx.push(Value::Object(ScriptObject::array(values)));
            }
            Action::InitObject => {
                let count = ctx.pop().to_integer().max(0.0) as usize;
                let obj = ScriptObject::plain();
                for _ in 0..count.min(ctx.stack_len() / 2) {
                    let value = ctx.pop();
                    let name = ctx.pop().to_string();
                    obj.define(&name, value);
                }
                ctx.push(Value::Object(obj));
            }
            Action::CallFunction => {
                let name = ctx.pop().to_string();
                let args = pop_args(ctx);
                let callee = self.get_variable(ctx, &name)?;
                let result = self.call_if_callable(&callee, Value::Undefined, &args, &name)?;
                ctx.push(result);
            }
            Action::CallMethod => {
                let method = ctx.pop();
                let target = ctx.pop();
                let args = pop_args(ctx);
                let result = match method_name(&method) {
                    None => self.call_if_callable(&target, Value::Undefined, &args, "<anonymous>")?,
                    Some(name) => {
                        let callee = self.get_member(&target, &name)?;
                        self.call_if_callable(&callee, target, &args, &name)?
                    }
                };
                ctx.push(result);
            }
            Action::Return => {
                let value = ctx.pop();
                ctx.set_return_value(value.clone());
                return Ok(Flow::Return(value));
            }
            Action::Throw => return Err(VmError::Thrown(ctx.pop())),

            // ==================== Control flow ====================
            Action::Jump(offset) => ctx.set_jump_offset(*offset),
            Action::If(offset) => {
                if ctx.pop().to_boolean() {
                    ctx.set_jump_offset(*offset);
                }
            }
            Action::With(body) => {
                let Value::Object(scope) = ctx.pop() else {
                    warn!("with on a non-object, body skipped");
                    return Ok(Flow::Continue);
                };
                ctx.scope_mut().push(scope);
                let mut guard = scopeguard::guard(&mut *ctx, |ctx| {
                    ctx.scope_mut().pop();
                });
                return self.run_block(&mut **guard, body);
            }
            Action::DefineFunction(def) => {
                let closure = Closure::simple(def, ctx.scope().clone(), Arc::clone(ctx.constants()));
                self.bind_function(ctx, closure);
            }
            Action::DefineFunction2(def) => {
                let closure =
                    Closure::with_registers(def, ctx.scope().clone(), Arc::clone(ctx.constants()));
                self.bind_function(ctx, closure);
            }

            Action::NotImplemented { code, length } => {
                debug!(code, length, "skipping action without an implementation");
            }
        }
        Ok(Flow::Continue)
    }

    // ==================== Helpers ====================

    fn push_value(&self, ctx: &ExecutionContext, value: &PushValue) -> Value {
        match value {
            PushValue::Str(s) => Value::string(s.as_str()),
            PushValue::Float(f) => Value::Number(*f as f64),
            PushValue::Null => Value::Null,
            PushValue::Undefined => Value::Undefined,
            PushValue::Register(r) => ctx.register(*r as usize),
            PushValue::Boolean(b) => Value::Boolean(*b),
            PushValue::Double(d) => Value::Number(*d),
            PushValue::Integer(i) => Value::Integer(*i),
            PushValue::Constant(index) => match ctx.constant(*index) {
                Some(s) => Value::String(s),
                None => {
                    debug!(index, pool = ctx.constants().len(), "constant index out of range");
                    Value::Undefined
                }
            },
        }
    }

    fn binary_number(&self, ctx: &mut ExecutionContext, op: impl Fn(f64, f64) -> f64) {
        let a = ctx.pop().to_number();
        let b = ctx.pop().to_number();
        ctx.push(Value::Number(op(b, a)));
    }

    fn binary_i32(&self, ctx: &mut ExecutionContext, op: impl Fn(i32, i32) -> i32) {
        let a = ctx.pop().to_i32();
        let b = ctx.pop().to_i32();
        ctx.push(Value::Integer(op(b, a)));
    }

    fn binary_string(&self, ctx: &mut ExecutionContext, op: impl Fn(&str, &str) -> bool) {
        let a = ctx.pop().to_string();
        let b = ctx.pop().to_string();
        ctx.push(Value::Boolean(op(&b, &a)));
    }

    fn bind_function(&self, ctx: &mut ExecutionContext, closure: Closure) {
        let name = closure.name().map(str::to_string);
        let function = ScriptObject::function(Callable::Closure(Arc::new(closure)));
        match name {
            Some(name) => ctx.local_scope().define(&name, Value::Object(function)),
            None => ctx.push(Value::Object(function)),
        }
    }

    /// Resolve a variable through the scope chain.
    ///
    /// Dotted paths resolve their first segment as a variable and the rest
    /// as members. Missing variables are `undefined`.
    pub fn get_variable(&self, ctx: &ExecutionContext, name: &str) -> VmResult<Value> {
        match name {
            "this" => return Ok(ctx.this().clone()),
            "_global" => return Ok(Value::Object(Arc::clone(self.worker.global()))),
            "_root" => {
                let root = self.worker.stage().root();
                return Ok(Value::Object(
                    root.unwrap_or_else(|| Arc::clone(self.worker.global())),
                ));
            }
            "_parent" => {
                let parent = self.worker.stage().parent_of(ctx.this());
                return Ok(parent.map_or(Value::Undefined, Value::Object));
            }
            _ => {}
        }
        if let Some((head, rest)) = name.split_once('.') {
            let mut value = self.get_variable(ctx, head)?;
            for segment in rest.split('.') {
                value = self.get_member(&value, segment)?;
            }
            return Ok(value);
        }
        match ctx.scope().find(name) {
            Some(scope) => scope.get(self.worker, name),
            None if self.worker.global().has_property(name) => {
                self.worker.global().get(self.worker, name)
            }
            None => {
                debug!(name, "variable is undefined");
                Ok(Value::Undefined)
            }
        }
    }

    /// Assign a variable: the innermost scope that has it, else the target
    pub fn set_variable(&self, ctx: &ExecutionContext, name: &str, value: Value) -> VmResult<()> {
        if let Some((path, member)) = name.rsplit_once('.') {
            let target = self.get_variable(ctx, path)?;
            return self.set_member(&target, member, value);
        }
        let scope = ctx
            .scope()
            .find(name)
            .unwrap_or_else(|| ctx.scope().base());
        scope.set(self.worker, name, value)
    }

    /// Read a member of any value
    pub fn get_member(&self, target: &Value, name: &str) -> VmResult<Value> {
        match target {
            Value::Object(obj) => obj.get(self.worker, name),
            Value::String(s) if name == "length" => Ok(Value::Integer(s.chars().count() as i32)),
            _ => Ok(Value::Undefined),
        }
    }

    /// Write a member; writes to primitives are ignored
    pub fn set_member(&self, target: &Value, name: &str, value: Value) -> VmResult<()> {
        match target {
            Value::Object(obj) => obj.set(self.worker, name, value),
            other => {
                debug!(name, target = other.type_of(), "member write on a primitive ignored");
                Ok(())
            }
        }
    }

    /// Call `callee` with `this` and `args`
    pub fn call_value(&self, callee: &Value, this: Value, args: &[Value]) -> VmResult<Value> {
        let callable = callee
            .as_object()
            .and_then(|obj| obj.as_callable())
            .ok_or_else(|| VmError::type_error(format!("{} is not a function", callee.type_of())))?;
        match callable {
            Callable::Closure(closure) => closure.call(self, this, args),
            Callable::Native(f) => {
                let _depth = self.worker.enter_call()?;
                f(self.worker, &this, args)
            }
        }
    }

    fn call_if_callable(
        &self,
        callee: &Value,
        this: Value,
        args: &[Value],
        name: &str,
    ) -> VmResult<Value> {
        if callee.as_object().and_then(|o| o.as_callable()).is_none() {
            debug!(name, "call of a non-function yields undefined");
            return Ok(Value::Undefined);
        }
        self.call_value(callee, this, args)
    }

    /// `new ctor(args)`
    pub fn construct(&self, ctor: &Value, args: &[Value]) -> VmResult<Value> {
        let Some(ctor_obj) = ctor.as_object().filter(|o| o.as_callable().is_some()) else {
            debug!(ctor = ctor.type_of(), "construct of a non-function yields undefined");
            return Ok(Value::Undefined);
        };
        let proto = ctor_obj.get(self.worker, "prototype")?;
        let this = ScriptObject::new("Object", proto.as_object().cloned());
        let result = self.call_value(ctor, Value::Object(Arc::clone(&this)), args)?;
        Ok(match result {
            Value::Object(obj) => Value::Object(obj),
            _ => Value::Object(this),
        })
    }

    /// `value instanceof ctor`, including interfaces
    pub fn instance_of(&self, value: &Value, ctor: &Value) -> VmResult<bool> {
        let (Some(obj), Some(ctor_obj)) = (value.as_object(), ctor.as_object()) else {
            return Ok(false);
        };
        let Value::Object(proto) = ctor_obj.get(self.worker, "prototype")? else {
            return Ok(false);
        };
        let mut current = obj.prototype();
        let mut depth = 0;
        while let Some(p) = current {
            if Arc::ptr_eq(&p, &proto) || p.interfaces().iter().any(|i| Arc::ptr_eq(i, ctor_obj)) {
                return Ok(true);
            }
            depth += 1;
            if depth > 256 {
                break;
            }
            current = p.prototype();
        }
        Ok(false)
    }
}

/// Pop an argument count, then that many values (first popped is first)
fn pop_args(ctx: &mut ExecutionContext) -> Args {
    let count = ctx.pop().to_integer().max(0.0) as usize;
    let count = count.min(ctx.stack_len());
    (0..count).map(|_| ctx.pop()).collect()
}

/// Method name operand of `CallMethod`/`NewMethod`; empty means "call the
/// object itself"
fn method_name(value: &Value) -> Option<String> {
    match value {
        Value::Undefined | Value::Null => None,
        v => Some(v.to_string()).filter(|s| !s.is_empty()),
    }
}

/// Push a null terminator, then every enumerable name of `target`
fn push_enumeration(ctx: &mut ExecutionContext, target: &Value) {
    ctx.push(Value::Null);
    if let Some(obj) = target.as_object() {
        for key in obj.keys() {
            ctx.push(Value::String(key));
        }
    }
}

/// Abstract `b < a`; undefined when either side is NaN
fn less_than(b: &Value, a: &Value) -> Value {
    if let (Value::String(b), Value::String(a)) = (b, a) {
        return Value::Boolean(b < a);
    }
    let (b, a) = (b.to_number(), a.to_number());
    if b.is_nan() || a.is_nan() {
        Value::Undefined
    } else {
        Value::Boolean(b < a)
    }
}

/// 1-based substring by characters; a negative count takes the rest
fn substring(s: &str, index: f64, count: f64) -> String {
    let start = index.max(1.0) as usize - 1;
    let chars = s.chars().skip(start);
    if count < 0.0 {
        chars.collect()
    } else {
        chars.take(count as usize).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring() {
        assert_eq!(substring("hello", 2.0, 3.0), "ell");
        assert_eq!(substring("hello", 0.0, 2.0), "he");
        assert_eq!(substring("hello", 4.0, -1.0), "lo");
        assert_eq!(substring("hello", 9.0, 2.0), "");
    }

    #[test]
    fn test_less_than() {
        assert_eq!(less_than(&Value::Integer(1), &Value::Integer(2)), Value::Boolean(true));
        assert_eq!(less_than(&Value::from("b"), &Value::from("a")), Value::Boolean(false));
        assert!(less_than(&Value::Undefined, &Value::Integer(2)).is_undefined());
    }

    #[test]
    fn test_method_name() {
        assert_eq!(method_name(&Value::Undefined), None);
        assert_eq!(method_name(&Value::from("")), None);
        assert_eq!(method_name(&Value::from("go")), Some("go".to_string()));
    }
}

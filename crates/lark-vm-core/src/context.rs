//! Execution context: the register bank and control state of one running
//! action block.

use std::sync::Arc;

use tracing::debug;

use crate::object::ObjectRef;
use crate::value::Value;

/// Number of registers in every bank
pub const REGISTER_COUNT: usize = 100;

/// Objects searched for variables, innermost last.
///
/// The first entry is the target timeline (the global object for top-level
/// code) and is never popped.
#[derive(Debug, Clone)]
pub struct ScopeChain {
    scopes: Vec<ObjectRef>,
}

impl ScopeChain {
    /// Chain containing only `base`
    pub fn new(base: ObjectRef) -> Self {
        Self { scopes: vec![base] }
    }

    /// Outermost scope
    pub fn base(&self) -> &ObjectRef {
        &self.scopes[0]
    }

    /// Innermost scope
    pub fn innermost(&self) -> &ObjectRef {
        &self.scopes[self.scopes.len() - 1]
    }

    /// Enter a scope
    pub fn push(&mut self, scope: ObjectRef) {
        self.scopes.push(scope);
    }

    /// Leave the innermost scope. The base is never removed.
    pub fn pop(&mut self) -> Option<ObjectRef> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    /// Number of scopes
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Always false; a chain has a base
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Scopes from innermost to outermost
    pub fn iter(&self) -> impl Iterator<Item = &ObjectRef> {
        self.scopes.iter().rev()
    }

    /// Innermost scope that has `name`
    pub fn find(&self, name: &str) -> Option<&ObjectRef> {
        self.iter().find(|scope| scope.has_property(name))
    }
}

/// Mutable run state for one action block or function invocation
#[derive(Debug)]
pub struct ExecutionContext {
    registers: Vec<Value>,
    stack: Vec<Value>,
    pending_jump: Option<i16>,
    return_value: Option<Value>,
    this: Value,
    scope: ScopeChain,
    constants: Arc<[Arc<str>]>,
    activation: Option<ObjectRef>,
}

impl ExecutionContext {
    /// Context running in `scope` with `this`
    pub fn new(scope: ScopeChain, this: Value) -> Self {
        Self {
            registers: vec![Value::Undefined; REGISTER_COUNT],
            stack: Vec::new(),
            pending_jump: None,
            return_value: None,
            this,
            scope,
            constants: Arc::from(Vec::new()),
            activation: None,
        }
    }

    /// Attach the activation object that receives function locals
    pub fn with_activation(mut self, activation: ObjectRef) -> Self {
        self.activation = Some(activation);
        self
    }

    /// Start from an inherited constant pool
    pub fn with_constants(mut self, constants: Arc<[Arc<str>]>) -> Self {
        self.constants = constants;
        self
    }

    // ==================== Registers ====================

    /// Size of the register bank
    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    /// Read a register. Out-of-range indices read as `undefined`.
    pub fn register(&self, index: usize) -> Value {
        match self.registers.get(index) {
            Some(v) => v.clone(),
            None => {
                debug!(index, "read of register outside the bank");
                Value::Undefined
            }
        }
    }

    /// Write a register. Out-of-range writes are ignored; returns whether
    /// the write happened.
    pub fn set_register(&mut self, index: usize, value: Value) -> bool {
        match self.registers.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => {
                debug!(index, "write to register outside the bank ignored");
                false
            }
        }
    }

    // ==================== Stack ====================

    /// Push onto the evaluation stack
    #[inline]
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pop; an empty stack yields `undefined`
    #[inline]
    pub fn pop(&mut self) -> Value {
        self.stack.pop().unwrap_or_default()
    }

    /// Top of the stack without popping
    pub fn peek(&self) -> Value {
        self.stack.last().cloned().unwrap_or_default()
    }

    /// Current stack depth
    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    // ==================== Control ====================

    /// Request a branch relative to the end of the current record
    pub fn set_jump_offset(&mut self, offset: i16) {
        self.pending_jump = Some(offset);
    }

    /// Consume the pending branch, if any
    pub fn take_jump_offset(&mut self) -> Option<i16> {
        self.pending_jump.take()
    }

    /// Store the function result
    pub fn set_return_value(&mut self, value: Value) {
        self.return_value = Some(value);
    }

    /// Function result, if `Return` executed
    pub fn return_value(&self) -> Option<&Value> {
        self.return_value.as_ref()
    }

    // ==================== Scope ====================

    /// `this`
    pub fn this(&self) -> &Value {
        &self.this
    }

    /// Scope chain
    pub fn scope(&self) -> &ScopeChain {
        &self.scope
    }

    /// Mutable scope chain
    pub fn scope_mut(&mut self) -> &mut ScopeChain {
        &mut self.scope
    }

    /// Activation object of the running function
    pub fn activation(&self) -> Option<&ObjectRef> {
        self.activation.as_ref()
    }

    /// Object receiving `DefineLocal`: the activation inside a function,
    /// the target otherwise
    pub fn local_scope(&self) -> &ObjectRef {
        self.activation.as_ref().unwrap_or_else(|| self.scope.base())
    }

    /// Current constant pool
    pub fn constants(&self) -> &Arc<[Arc<str>]> {
        &self.constants
    }

    /// Replace the constant pool
    pub fn set_constants(&mut self, pool: &[String]) {
        self.constants = pool.iter().map(|s| Arc::from(s.as_str())).collect();
    }

    /// Constant pool entry
    pub fn constant(&self, index: u16) -> Option<Arc<str>> {
        self.constants.get(index as usize).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ScriptObject;

    fn context() -> ExecutionContext {
        ExecutionContext::new(ScopeChain::new(ScriptObject::plain()), Value::Undefined)
    }

    #[test]
    fn test_register_bank_is_fixed() {
        let mut ctx = context();
        assert_eq!(ctx.register_count(), REGISTER_COUNT);
        assert!(ctx.set_register(99, Value::Integer(7)));
        assert!(!ctx.set_register(150, Value::Integer(9)));
        assert_eq!(ctx.register_count(), REGISTER_COUNT);
        assert_eq!(ctx.register(99), Value::Integer(7));
        assert_eq!(ctx.register(150), Value::Undefined);
        for i in 0..99 {
            assert!(ctx.register(i).is_undefined());
        }
    }

    #[test]
    fn test_pending_jump_is_consumed() {
        let mut ctx = context();
        ctx.set_jump_offset(-4);
        assert_eq!(ctx.take_jump_offset(), Some(-4));
        assert_eq!(ctx.take_jump_offset(), None);
    }

    #[test]
    fn test_empty_stack_pops_undefined() {
        let mut ctx = context();
        assert!(ctx.pop().is_undefined());
        ctx.push(Value::Integer(1));
        assert_eq!(ctx.peek(), Value::Integer(1));
        assert_eq!(ctx.stack_len(), 1);
    }

    #[test]
    fn test_scope_base_is_never_popped() {
        let mut scope = ScopeChain::new(ScriptObject::plain());
        scope.push(ScriptObject::plain());
        assert!(scope.pop().is_some());
        assert!(scope.pop().is_none());
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn test_constant_pool() {
        let mut ctx = context();
        ctx.set_constants(&["x".to_string(), "y".to_string()]);
        assert_eq!(ctx.constant(1).as_deref(), Some("y"));
        assert_eq!(ctx.constant(2), None);
    }
}

//! Helpers for host functions exposed to script

use std::sync::Arc;

use lark_vm_core::{
    ByteArray, Domain, NativeFunction, ObjectRef, ScriptObject, Value, VmError, VmResult, Worker,
};

/// Arguments of one host call, with arity checks and typed access
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    function: &'static str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    /// Wrap `values` passed to `function`
    pub fn new(function: &'static str, values: &'a [Value]) -> Self {
        Self { function, values }
    }

    /// Require between `min` and `max` arguments
    pub fn expect(self, min: usize, max: usize) -> VmResult<Self> {
        let n = self.values.len();
        if (min..=max).contains(&n) {
            return Ok(self);
        }
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{min}-{max}")
        };
        Err(VmError::argument_count(self.function, expected, n))
    }

    /// Require at least `min` arguments
    pub fn at_least(self, min: usize) -> VmResult<Self> {
        let n = self.values.len();
        if n >= min {
            Ok(self)
        } else {
            Err(VmError::argument_count(
                self.function,
                format!(">{}", min.saturating_sub(1)),
                n,
            ))
        }
    }

    /// Number of arguments supplied
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when called without arguments
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument `i`, `undefined` if missing
    pub fn get(&self, i: usize) -> Value {
        self.values.get(i).cloned().unwrap_or_default()
    }

    /// Argument `i` as a string
    pub fn string(&self, i: usize) -> String {
        self.get(i).to_string()
    }

    /// Argument `i` as `uint`, or `default` when missing or undefined
    pub fn u32_or(&self, i: usize, default: u32) -> u32 {
        match self.values.get(i) {
            None | Some(Value::Undefined) => default,
            Some(v) => v.to_u32(),
        }
    }

    /// Argument `i` as a `ByteArray`
    pub fn byte_array(&self, i: usize) -> VmResult<Arc<ByteArray>> {
        self.optional_byte_array(i)?.ok_or_else(|| {
            VmError::type_error(format!(
                "argument {i} of {} must be a ByteArray, got null",
                self.function
            ))
        })
    }

    /// Argument `i` as a `ByteArray`; `null` and `undefined` give `None`
    pub fn optional_byte_array(&self, i: usize) -> VmResult<Option<Arc<ByteArray>>> {
        match self.get(i) {
            Value::Undefined | Value::Null => Ok(None),
            Value::Object(obj) if obj.as_byte_array().is_some() => {
                Ok(obj.as_byte_array().cloned())
            }
            other => Err(VmError::type_error(format!(
                "argument {i} of {} must be a ByteArray, got {}",
                self.function,
                other.type_of()
            ))),
        }
    }

    /// Argument `i` as a `Domain`; `null` and `undefined` give `None`
    pub fn optional_domain(&self, i: usize) -> VmResult<Option<Arc<Domain>>> {
        match self.get(i) {
            Value::Undefined | Value::Null => Ok(None),
            Value::Object(obj) if obj.as_domain().is_some() => Ok(obj.as_domain().cloned()),
            other => Err(VmError::type_error(format!(
                "argument {i} of {} must be a Domain, got {}",
                self.function,
                other.type_of()
            ))),
        }
    }
}

/// Wrap a host closure
pub fn native(
    f: impl Fn(&Worker, &Value, &[Value]) -> VmResult<Value> + Send + Sync + 'static,
) -> NativeFunction {
    Arc::new(f)
}

/// Define a host method on `target`
pub fn define_method(
    target: &ObjectRef,
    name: &str,
    f: impl Fn(&Worker, &Value, &[Value]) -> VmResult<Value> + Send + Sync + 'static,
) {
    target.define(name, Value::Object(ScriptObject::native_function(f)));
}

/// Define a read-only accessor on `target`
pub fn define_getter(
    target: &ObjectRef,
    name: &str,
    f: impl Fn(&Worker, &Value, &[Value]) -> VmResult<Value> + Send + Sync + 'static,
) {
    target.define_accessor(name, Some(native(f)), None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity() {
        let values = [Value::from("a")];
        assert!(Args::new("f", &values).expect(1, 2).is_ok());
        let err = Args::new("write", &values).expect(2, 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ArgumentError: write expects 2 argument(s), got 1"
        );
        let err = Args::new("exec", &[]).at_least(1).unwrap_err();
        assert!(matches!(
            err,
            VmError::ArgumentCount { ref expected, actual: 0, .. } if expected == ">0"
        ));
    }

    #[test]
    fn test_typed_access() {
        let bytes = Arc::new(ByteArray::new(8));
        let values = [
            Value::Object(ScriptObject::byte_array(bytes.clone())),
            Value::Null,
            Value::Integer(3),
        ];
        let args = Args::new("f", &values);
        assert!(Arc::ptr_eq(&args.byte_array(0).unwrap(), &bytes));
        assert!(args.optional_byte_array(1).unwrap().is_none());
        assert!(args.byte_array(1).is_err());
        assert!(matches!(args.optional_domain(2), Err(VmError::TypeError(_))));
        assert_eq!(args.u32_or(2, 0), 3);
        assert_eq!(args.u32_or(5, 7), 7);
        assert!(args.get(9).is_undefined());
    }
}

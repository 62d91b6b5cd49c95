//! Script objects
//!
//! Objects are shared (`Arc`) and internally locked, so a value can be
//! handed to natives and stored in scopes without copying. Properties keep
//! insertion order, which is the order `ActionEnumerate` reports them in.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use tracing::debug;

use crate::byte_array::ByteArray;
use crate::closure::Closure;
use crate::domain::Domain;
use crate::error::VmResult;
use crate::value::Value;
use crate::worker::Worker;

/// Shared object reference
pub type ObjectRef = Arc<ScriptObject>;

/// Host function: `(worker, this, args) -> result`
pub type NativeFunction = Arc<dyn Fn(&Worker, &Value, &[Value]) -> VmResult<Value> + Send + Sync>;

const MAX_PROTOTYPE_DEPTH: usize = 256;
const MAX_JOIN_DEPTH: usize = 256;

thread_local! {
    /// Arrays being stringified on this thread, innermost last
    static JOINING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Something that can be invoked
#[derive(Clone)]
pub enum Callable {
    /// Function defined by `DefineFunction`/`DefineFunction2`
    Closure(Arc<Closure>),
    /// Host function
    Native(NativeFunction),
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Closure(c) => write!(f, "Closure({:?})", c.name()),
            Callable::Native(_) => f.write_str("Native"),
        }
    }
}

/// A property slot
#[derive(Clone)]
pub enum Property {
    /// Plain value
    Data(Value),
    /// Native getter/setter pair
    Accessor {
        /// Getter, called with no arguments
        get: Option<NativeFunction>,
        /// Setter, called with the new value
        set: Option<NativeFunction>,
    },
}

/// Host payload carried by an object
#[derive(Debug, Default)]
pub enum NativeData {
    /// Plain object
    #[default]
    None,
    /// Function object
    Function(Callable),
    /// `ByteArray` instance
    ByteArray(Arc<ByteArray>),
    /// `Domain` instance
    Domain(Arc<Domain>),
}

/// A dynamic object
pub struct ScriptObject {
    class_name: Arc<str>,
    prototype: RwLock<Option<ObjectRef>>,
    properties: RwLock<IndexMap<Arc<str>, Property>>,
    interfaces: RwLock<Vec<ObjectRef>>,
    native: NativeData,
}

impl ScriptObject {
    /// Create an object of `class_name`
    pub fn new(class_name: &str, prototype: Option<ObjectRef>) -> ObjectRef {
        Self::with_native(class_name, prototype, NativeData::None)
    }

    /// Create an object carrying a host payload
    pub fn with_native(
        class_name: &str,
        prototype: Option<ObjectRef>,
        native: NativeData,
    ) -> ObjectRef {
        Arc::new(Self {
            class_name: class_name.into(),
            prototype: RwLock::new(prototype),
            properties: RwLock::new(IndexMap::new()),
            interfaces: RwLock::new(Vec::new()),
            native,
        })
    }

    /// Plain `Object`
    pub fn plain() -> ObjectRef {
        Self::new("Object", None)
    }

    /// `Array` holding `values` at indices `0..n`
    pub fn array(values: impl IntoIterator<Item = Value>) -> ObjectRef {
        let obj = Self::new("Array", None);
        let mut len = 0;
        {
            let mut props = obj.properties.write();
            for (i, value) in values.into_iter().enumerate() {
                props.insert(i.to_string().into(), Property::Data(value));
                len = i + 1;
            }
            props.insert("length".into(), Property::Data(Value::Integer(len as i32)));
        }
        obj
    }

    /// Function object with a fresh `prototype` object
    pub fn function(callable: Callable) -> ObjectRef {
        let obj = Self::with_native("Function", None, NativeData::Function(callable));
        obj.define("prototype", Value::Object(Self::plain()));
        obj
    }

    /// Function object wrapping a host closure
    pub fn native_function(
        f: impl Fn(&Worker, &Value, &[Value]) -> VmResult<Value> + Send + Sync + 'static,
    ) -> ObjectRef {
        Self::function(Callable::Native(Arc::new(f)))
    }

    /// `ByteArray` object
    pub fn byte_array(bytes: Arc<ByteArray>) -> ObjectRef {
        Self::with_native("ByteArray", None, NativeData::ByteArray(bytes))
    }

    /// Class name used by `toString` and host type checks
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Host payload
    pub fn native(&self) -> &NativeData {
        &self.native
    }

    /// Callable payload, if this is a function
    pub fn as_callable(&self) -> Option<&Callable> {
        match &self.native {
            NativeData::Function(c) => Some(c),
            _ => None,
        }
    }

    /// Byte buffer payload, if this is a `ByteArray`
    pub fn as_byte_array(&self) -> Option<&Arc<ByteArray>> {
        match &self.native {
            NativeData::ByteArray(b) => Some(b),
            _ => None,
        }
    }

    /// Domain payload, if this is a `Domain`
    pub fn as_domain(&self) -> Option<&Arc<Domain>> {
        match &self.native {
            NativeData::Domain(d) => Some(d),
            _ => None,
        }
    }

    /// True for `Array` objects
    pub fn is_array(&self) -> bool {
        &*self.class_name == "Array"
    }

    /// `__proto__`
    pub fn prototype(&self) -> Option<ObjectRef> {
        self.prototype.read().clone()
    }

    /// Replace `__proto__`
    pub fn set_prototype(&self, prototype: Option<ObjectRef>) {
        *self.prototype.write() = prototype;
    }

    /// Interfaces registered with `ActionImplementsOp`
    pub fn interfaces(&self) -> Vec<ObjectRef> {
        self.interfaces.read().clone()
    }

    /// Replace the interface list
    pub fn set_interfaces(&self, interfaces: Vec<ObjectRef>) {
        *self.interfaces.write() = interfaces;
    }

    /// Define or overwrite an own data property
    pub fn define(&self, name: &str, value: Value) {
        self.properties
            .write()
            .insert(name.into(), Property::Data(value));
    }

    /// Define a native accessor property
    pub fn define_accessor(
        &self,
        name: &str,
        get: Option<NativeFunction>,
        set: Option<NativeFunction>,
    ) {
        self.properties
            .write()
            .insert(name.into(), Property::Accessor { get, set });
    }

    /// Own property slot
    pub fn get_own(&self, name: &str) -> Option<Property> {
        self.properties.read().get(name).cloned()
    }

    /// Own data value, skipping accessors
    pub fn get_own_value(&self, name: &str) -> Option<Value> {
        match self.properties.read().get(name) {
            Some(Property::Data(v)) => Some(v.clone()),
            _ => None,
        }
    }

    /// True if the property exists here or on the prototype chain
    pub fn has_property(&self, name: &str) -> bool {
        if self.byte_array_slot(name).is_some() {
            return true;
        }
        self.lookup(name).is_some()
    }

    fn lookup(&self, name: &str) -> Option<Property> {
        if let Some(p) = self.get_own(name) {
            return Some(p);
        }
        let mut proto = self.prototype();
        let mut depth = 0;
        while let Some(obj) = proto {
            if let Some(p) = obj.get_own(name) {
                return Some(p);
            }
            depth += 1;
            if depth > MAX_PROTOTYPE_DEPTH {
                debug!(name, "prototype chain too deep");
                return None;
            }
            proto = obj.prototype();
        }
        None
    }

    fn byte_array_slot(&self, name: &str) -> Option<Value> {
        let bytes = self.as_byte_array()?;
        if name == "length" {
            return Some(Value::Integer(bytes.len() as i32));
        }
        let index = name.parse::<usize>().ok()?;
        Some(bytes.get(index).map_or(Value::Undefined, |b| Value::Integer(b as i32)))
    }

    /// Read a property, running accessors
    pub fn get(self: &Arc<Self>, worker: &Worker, name: &str) -> VmResult<Value> {
        if let Some(v) = self.byte_array_slot(name) {
            return Ok(v);
        }
        if name == "__proto__" {
            return Ok(self.prototype().map_or(Value::Undefined, Value::Object));
        }
        match self.lookup(name) {
            Some(Property::Data(v)) => Ok(v),
            Some(Property::Accessor { get: Some(getter), .. }) => {
                getter(worker, &Value::Object(Arc::clone(self)), &[])
            }
            Some(Property::Accessor { get: None, .. }) | None => Ok(Value::Undefined),
        }
    }

    /// Write a property, running setters found on the chain
    pub fn set(self: &Arc<Self>, worker: &Worker, name: &str, value: Value) -> VmResult<()> {
        if let Some(bytes) = self.as_byte_array()
            && let Ok(index) = name.parse::<usize>()
        {
            bytes.set(index, value.to_i32() as u8);
            return Ok(());
        }
        if name == "__proto__" {
            self.set_prototype(value.as_object().cloned());
            return Ok(());
        }
        match self.lookup(name) {
            Some(Property::Accessor { set: Some(setter), .. }) => {
                setter(worker, &Value::Object(Arc::clone(self)), &[value])?;
                return Ok(());
            }
            Some(Property::Accessor { set: None, .. }) => {
                debug!(name, class = %self.class_name, "ignoring write to read-only property");
                return Ok(());
            }
            _ => {}
        }
        if self.is_array()
            && let Ok(index) = name.parse::<usize>()
        {
            let len = self.array_len();
            if index >= len {
                self.define("length", Value::Integer(index as i32 + 1));
            }
        }
        self.define(name, value);
        Ok(())
    }

    /// Remove an own property
    pub fn delete(&self, name: &str) -> bool {
        self.properties.write().shift_remove(name).is_some()
    }

    /// Enumerable names: own first, then inherited, skipping `__` names
    pub fn keys(&self) -> Vec<Arc<str>> {
        let mut keys: IndexSet<Arc<str>> = IndexSet::new();
        let mut current = Some(self.properties.read().keys().cloned().collect::<Vec<_>>());
        let mut proto = self.prototype();
        let mut depth = 0;
        while let Some(names) = current.take() {
            keys.extend(names.into_iter().filter(|k| !k.starts_with("__")));
            if let Some(obj) = proto.take()
                && depth < MAX_PROTOTYPE_DEPTH
            {
                depth += 1;
                current = Some(obj.properties.read().keys().cloned().collect());
                proto = obj.prototype();
            }
        }
        if self.is_array() {
            keys.shift_remove("length");
        }
        keys.into_iter().collect()
    }

    /// `length` of an array
    pub fn array_len(&self) -> usize {
        self.get_own_value("length")
            .map_or(0, |v| v.to_integer().max(0.0) as usize)
    }

    /// Elements `0..length` of an array
    pub fn array_values(&self) -> Vec<Value> {
        (0..self.array_len())
            .map(|i| self.get_own_value(&i.to_string()).unwrap_or_default())
            .collect()
    }

    /// String conversion used by `ToString` and `trace`
    pub fn to_display_string(&self) -> String {
        match &self.native {
            NativeData::Function(_) => "[type Function]".to_string(),
            NativeData::ByteArray(bytes) => String::from_utf8_lossy(&bytes.to_vec()).into_owned(),
            NativeData::Domain(_) => "[object Domain]".to_string(),
            NativeData::None if self.is_array() => self.join_elements(),
            NativeData::None => "[object Object]".to_string(),
        }
    }

    /// Comma-joined elements. An array already being joined on this
    /// thread renders as the empty string.
    fn join_elements(&self) -> String {
        let key = self as *const Self as usize;
        let entered = JOINING.with(|joining| {
            let mut joining = joining.borrow_mut();
            if joining.len() >= MAX_JOIN_DEPTH || joining.contains(&key) {
                return false;
            }
            joining.push(key);
            true
        });
        if !entered {
            debug!(class = %self.class_name, "cyclic or too deep array join");
            return String::new();
        }
        let _leave = scopeguard::guard((), |()| {
            JOINING.with(|joining| joining.borrow_mut().pop());
        });
        self.array_values()
            .iter()
            .map(|v| match v {
                Value::Undefined | Value::Null => String::new(),
                v => v.to_string(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Debug for ScriptObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<_> = self.properties.read().keys().cloned().collect();
        f.debug_struct("ScriptObject")
            .field("class", &self.class_name)
            .field("properties", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_layout() {
        let arr = ScriptObject::array([Value::Integer(1), Value::from("two")]);
        assert_eq!(arr.array_len(), 2);
        assert_eq!(arr.to_display_string(), "1,two");
        assert_eq!(
            arr.keys().iter().map(|k| k.to_string()).collect::<Vec<_>>(),
            vec!["0", "1"]
        );
    }

    #[test]
    fn test_self_referencing_array_joins() {
        let arr = ScriptObject::array([Value::Integer(1)]);
        arr.define("1", Value::Object(arr.clone()));
        arr.define("length", Value::Integer(2));
        assert_eq!(Value::Object(arr.clone()).to_string(), "1,");
        // Entry is released after the join
        assert_eq!(arr.to_display_string(), "1,");
    }

    #[test]
    fn test_mutually_referencing_arrays_join() {
        let a = ScriptObject::array([Value::from("a")]);
        let b = ScriptObject::array([Value::from("b"), Value::Object(a.clone())]);
        a.define("1", Value::Object(b.clone()));
        a.define("length", Value::Integer(2));
        assert_eq!(a.to_display_string(), "a,b,");
        assert_eq!(b.to_display_string(), "b,a,");
    }

    #[test]
    fn test_deeply_nested_array_join_is_bounded() {
        let mut arr = ScriptObject::array([Value::Integer(0)]);
        for _ in 0..1_000 {
            arr = ScriptObject::array([Value::Object(arr)]);
        }
        assert_eq!(arr.to_display_string(), "");
    }

    #[test]
    fn test_prototype_lookup_and_shadowing() {
        let proto = ScriptObject::plain();
        proto.define("shared", Value::Integer(1));
        let obj = ScriptObject::new("Object", Some(proto.clone()));
        assert!(obj.has_property("shared"));
        assert_eq!(obj.get_own_value("shared"), None);
        obj.define("shared", Value::Integer(2));
        assert_eq!(obj.get_own_value("shared"), Some(Value::Integer(2)));
        assert_eq!(proto.get_own_value("shared"), Some(Value::Integer(1)));
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let obj = ScriptObject::plain();
        obj.define("b", Value::Null);
        obj.define("a", Value::Null);
        obj.define("__hidden", Value::Null);
        let keys: Vec<_> = obj.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert!(obj.delete("b"));
        assert!(!obj.delete("b"));
    }

    #[test]
    fn test_byte_array_virtual_slots() {
        let obj = ScriptObject::byte_array(Arc::new(ByteArray::from_bytes(b"AB")));
        assert!(obj.has_property("length"));
        assert!(obj.has_property("1"));
        assert_eq!(obj.to_display_string(), "AB");
    }
}

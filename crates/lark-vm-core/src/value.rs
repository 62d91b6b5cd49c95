//! Script values and their conversions

use std::fmt;
use std::sync::Arc;

use crate::object::{NativeData, ObjectRef};

/// An AVM1 value.
///
/// Objects are shared by reference; everything else is copied.
#[derive(Clone, Default)]
pub enum Value {
    /// `undefined`
    #[default]
    Undefined,
    /// `null`
    Null,
    /// Boolean
    Boolean(bool),
    /// 32-bit integer, as pushed by integer literals
    Integer(i32),
    /// Double precision number
    Number(f64),
    /// Immutable string
    String(Arc<str>),
    /// Object reference
    Object(ObjectRef),
}

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    /// Create a number value
    #[inline]
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    /// True for `undefined`
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// True for `null` or `undefined`
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// True for integers and numbers
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Number(_))
    }

    /// Object reference, if this is an object
    #[inline]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// String contents, if this is a string
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric conversion.
    ///
    /// Strings are trimmed; empty or malformed strings give NaN. Objects
    /// give NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => *b as u8 as f64,
            Value::Integer(i) => *i as f64,
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s),
            Value::Object(_) => f64::NAN,
        }
    }

    /// Truthiness: non-empty strings are true, NaN and zero are false
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// ECMAScript `ToInt32`
    pub fn to_i32(&self) -> i32 {
        match self {
            Value::Integer(i) => *i,
            other => f64_to_i32(other.to_number()),
        }
    }

    /// ECMAScript `ToUint32`
    pub fn to_u32(&self) -> u32 {
        self.to_i32() as u32
    }

    /// Truncate toward zero; NaN gives zero
    pub fn to_integer(&self) -> f64 {
        let n = self.to_number();
        if n.is_nan() { 0.0 } else { n.trunc() }
    }

    /// Result of `typeof`
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) | Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(obj) if matches!(obj.native(), NativeData::Function(_)) => "function",
            Value::Object(_) => "object",
        }
    }

    /// Abstract equality (`ActionEquals2`)
    pub fn loose_eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Undefined | Null, Undefined | Null) => true,
            (Undefined | Null, _) | (_, Undefined | Null) => false,
            (Object(a), Object(b)) => Arc::ptr_eq(a, b),
            (Object(_), _) | (_, Object(_)) => false,
            (String(a), String(b)) => a == b,
            (a, b) => a.to_number() == b.to_number(),
        }
    }

    /// Strict equality (`ActionStrictEquals`)
    pub fn strict_eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Undefined, Undefined) | (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Object(a), Object(b)) => Arc::ptr_eq(a, b),
            (a, b) if a.is_number() && b.is_number() => a.to_number() == b.to_number(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Object(obj) => f.write_str(&obj.to_display_string()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Object(obj) => write!(f, "{obj:?}"),
            other => write!(f, "{other}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

/// Format a number the way the player prints it
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn parse_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return f64::NAN;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).map_or(f64::NAN, |v| v as f64);
    }
    if !s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

fn f64_to_i32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let n = n.trunc() % 4_294_967_296.0;
    let n = if n < 0.0 { n + 4_294_967_296.0 } else { n };
    n as u32 as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_number() {
        assert_eq!(Value::from(" 42 ").to_number(), 42.0);
        assert_eq!(Value::from("0x1F").to_number(), 31.0);
        assert!(Value::from("").to_number().is_nan());
        assert!(Value::from("12px").to_number().is_nan());
        assert!(Value::Undefined.to_number().is_nan());
        assert_eq!(Value::Null.to_number(), 0.0);
        assert_eq!(Value::from(true).to_number(), 1.0);
    }

    #[test]
    fn test_to_boolean() {
        assert!(Value::from("0").to_boolean());
        assert!(!Value::from("").to_boolean());
        assert!(!Value::Number(f64::NAN).to_boolean());
        assert!(!Value::Integer(0).to_boolean());
        assert!(!Value::Null.to_boolean());
    }

    #[test]
    fn test_to_string() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(0.5).to_string(), "0.5");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::Undefined.to_string(), "undefined");
    }

    #[test]
    fn test_to_i32_wraps() {
        assert_eq!(Value::Number(4_294_967_297.0).to_i32(), 1);
        assert_eq!(Value::Number(-1.5).to_i32(), -1);
        assert_eq!(Value::Number(2_147_483_648.0).to_i32(), i32::MIN);
        assert_eq!(Value::Number(f64::INFINITY).to_i32(), 0);
        assert_eq!(Value::Number(-1.0).to_u32(), u32::MAX);
    }

    #[test]
    fn test_equality() {
        assert!(Value::Null.loose_eq(&Value::Undefined));
        assert!(!Value::Null.strict_eq(&Value::Undefined));
        assert!(Value::from("1").loose_eq(&Value::Integer(1)));
        assert!(!Value::from("1").strict_eq(&Value::Integer(1)));
        assert!(Value::Integer(2).strict_eq(&Value::Number(2.0)));
        assert!(Value::from(true).loose_eq(&Value::Integer(1)));
        assert!(!Value::Number(f64::NAN).loose_eq(&Value::Number(f64::NAN)));
    }
}

//! Coercion and comparison rules (§4.1): `ToBool`, `ToInt`, `ToFloat`,
//! `ToString`, `Equals`, plus the `ArrayGet`/`ArraySet` accessors.
//!
//! `Value::Object`'s `ToString` needs the registry (to find `__toString`)
//! and the call machinery (to run it), neither of which a bare `Value`
//! method has access to. `to_string_lossy` here is the registry-free
//! fallback every non-object kind resolves completely on its own; the
//! context-level `ExecutionContext::stringify` in `context.rs` is what
//! opcode handlers actually call, and it special-cases `Object` before
//! falling back to this method.

use crate::value::{ArrayKey, PhpArray, Value};

impl Value {
    pub fn to_bool(&self) -> bool {
        match self.deref() {
            Value::Null => false,
            Value::Bool(b) => b,
            Value::Int(n) => n != 0,
            Value::Float(f) => f != 0.0,
            Value::String(s) => !s.is_empty() && s != "0",
            Value::Array(arr) => !arr.is_empty(),
            Value::Object(_) | Value::Callable(_) | Value::Resource(_) => true,
            Value::Reference(_) => unreachable!("deref() never returns Reference"),
        }
    }

    /// Parse the leading numeric prefix of a string: optional sign, digits,
    /// an optional `.digits` fraction, an optional `e[+-]digits` exponent.
    /// Returns `None` if no numeric prefix is present at all.
    fn leading_numeric_prefix(s: &str) -> Option<f64> {
        let bytes = s.as_bytes();
        let mut i = 0usize;
        // Per PHP's numeric-string rule, leading whitespace is skipped.
        while i < bytes.len() && (bytes[i] as char).is_whitespace() {
            i += 1;
        }
        let start = i;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let digits_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let mut saw_digits = i > digits_start;
        if i < bytes.len() && bytes[i] == b'.' {
            let frac_start = i + 1;
            let mut j = frac_start;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > frac_start || saw_digits {
                i = j;
                saw_digits = saw_digits || j > frac_start;
            }
        }
        if !saw_digits {
            return None;
        }
        if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
            let mut j = i + 1;
            if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                j += 1;
            }
            let exp_digits_start = j;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > exp_digits_start {
                i = j;
            }
        }
        s[start..i].parse::<f64>().ok()
    }

    pub fn to_int(&self) -> i64 {
        match self.deref() {
            Value::Null => 0,
            Value::Bool(b) => i64::from(b),
            Value::Int(n) => n,
            Value::Float(f) => f as i64,
            Value::String(s) => Self::leading_numeric_prefix(&s).unwrap_or(0.0) as i64,
            Value::Array(arr) => i64::from(!arr.is_empty()),
            Value::Object(_) | Value::Callable(_) | Value::Resource(_) => 1,
            Value::Reference(_) => unreachable!("deref() never returns Reference"),
        }
    }

    pub fn to_float(&self) -> f64 {
        match self.deref() {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int(n) => n as f64,
            Value::Float(f) => f,
            Value::String(s) => Self::leading_numeric_prefix(&s).unwrap_or(0.0),
            Value::Array(arr) => {
                if arr.is_empty() {
                    0.0
                } else {
                    1.0
                }
            }
            Value::Object(_) | Value::Callable(_) | Value::Resource(_) => 1.0,
            Value::Reference(_) => unreachable!("deref() never returns Reference"),
        }
    }

    /// Registry-free `ToString`. Arrays stringify to the literal `"Array"`
    /// (with a suppressible diagnostic raised by the caller, not here);
    /// objects and callables fall back to a debug-ish placeholder — callers
    /// that can reach the registry (see `ExecutionContext::stringify`)
    /// should special-case `Object` before ever calling this.
    pub fn to_string_lossy(&self) -> String {
        match self.deref() {
            Value::Null => String::new(),
            Value::Bool(b) => {
                if b {
                    "1".to_string()
                } else {
                    String::new()
                }
            }
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_float(f),
            Value::String(s) => s,
            Value::Array(_) => "Array".to_string(),
            Value::Object(obj) => format!("Object({})", obj.borrow().class_name),
            Value::Callable(c) => format!("Closure({})", c.display_name()),
            Value::Resource(r) => format!("Resource(#{})", r.id),
            Value::Reference(_) => unreachable!("deref() never returns Reference"),
        }
    }

    pub fn get_type(&self) -> &'static str {
        match self.deref() {
            Value::Null => "NULL",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "double",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) | Value::Callable(_) => "object",
            Value::Resource(_) => "resource",
            Value::Reference(_) => unreachable!("deref() never returns Reference"),
        }
    }

    /// `Equals(strict)`: identical kind and identical payload.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self.deref(), other.deref()) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                if a.len() != b.len() {
                    return false;
                }
                a.iter().zip(b.iter()).all(|((k1, v1), (k2, v2))| {
                    k1 == k2 && v1.strict_equals(v2)
                })
            }
            (Value::Object(a), Value::Object(b)) => std::rc::Rc::ptr_eq(&a, &b),
            (Value::Resource(a), Value::Resource(b)) => std::rc::Rc::ptr_eq(&a, &b),
            (Value::Callable(a), Value::Callable(b)) => callable_identity_eq(&a, &b),
            _ => false,
        }
    }

    /// `Equals(loose)`: numeric-string-aware, type-punned equality.
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self.deref(), other.deref()) {
            (Value::Null, Value::Null) => true,
            (Value::Null, Value::Bool(b)) | (Value::Bool(b), Value::Null) => !b,
            (Value::Null, other) | (other, Value::Null) => !other.to_bool(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Bool(_), _) | (_, Value::Bool(_)) => self.to_bool() == other.to_bool(),
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => a as f64 == b,
            (Value::String(a), Value::String(b)) => {
                match (Self::leading_numeric_prefix(&a), Self::leading_numeric_prefix(&b)) {
                    (Some(_), Some(_)) if is_fully_numeric(&a) && is_fully_numeric(&b) => {
                        a.parse::<f64>().unwrap() == b.parse::<f64>().unwrap()
                    }
                    _ => a == b,
                }
            }
            (Value::Int(n), Value::String(s)) | (Value::String(s), Value::Int(n)) => {
                if is_fully_numeric(&s) {
                    n as f64 == s.parse::<f64>().unwrap_or(f64::NAN)
                } else {
                    false
                }
            }
            (Value::Float(n), Value::String(s)) | (Value::String(s), Value::Float(n)) => {
                if is_fully_numeric(&s) {
                    n == s.parse::<f64>().unwrap_or(f64::NAN)
                } else {
                    false
                }
            }
            (Value::Array(a), Value::Array(b)) => {
                if a.len() != b.len() {
                    return false;
                }
                a.iter().all(|(k, v)| match b.get(k) {
                    Some(ov) => v.loose_equals(ov),
                    None => false,
                })
            }
            (Value::Object(a), Value::Object(b)) => {
                std::rc::Rc::ptr_eq(&a, &b) || {
                    let (ba, bb) = (a.borrow(), b.borrow());
                    ba.class_name == bb.class_name && ba.properties == bb.properties
                }
            }
            (Value::Resource(a), Value::Resource(b)) => std::rc::Rc::ptr_eq(&a, &b),
            (Value::Callable(a), Value::Callable(b)) => callable_identity_eq(&a, &b),
            _ => false,
        }
    }

    /// `ArrayGet`: non-Array targets return `Null` without mutation.
    pub fn array_get(&self, key: &Value) -> Value {
        match self.deref() {
            Value::Array(arr) => {
                let k = ArrayKey::from_value(&key.deref());
                arr.get(&k).cloned().unwrap_or(Value::Null)
            }
            _ => Value::Null,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

fn callable_identity_eq(a: &crate::value::CallableValue, b: &crate::value::CallableValue) -> bool {
    use crate::value::CallableValue::*;
    match (a, b) {
        (Named(x), Named(y)) => x.eq_ignore_ascii_case(y),
        (Closure(x), Closure(y)) => std::rc::Rc::ptr_eq(x, y),
        _ => false,
    }
}

fn is_fully_numeric(s: &str) -> bool {
    let t = s.trim();
    if t.is_empty() {
        return false;
    }
    t.parse::<f64>().is_ok()
}

/// `Float -> String`: whole-valued floats render without a fractional part
/// (mirrors the target language's default `precision` ini formatting).
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{f:.0}")
    } else {
        format!("{f}")
    }
}

/// `ArraySet`: auto-creates an `Array` from a non-Array `Null` target (only
/// where explicitly permitted by the opcode, e.g. `AssignDim`); a `None` key
/// appends via `NextAutoIndex`.
pub fn array_set(target: &mut Value, key: Option<&Value>, value: Value) -> Result<(), String> {
    if matches!(target, Value::Null) {
        *target = Value::new_array();
    }
    match target {
        Value::Array(arr) => {
            match key {
                Some(k) => arr.set(ArrayKey::from_value(&k.deref()), value),
                None => {
                    arr.append(value);
                }
            }
            Ok(())
        }
        other => Err(format!(
            "Cannot use a scalar value of type {} as an array",
            other.get_type()
        )),
    }
}

#[allow(dead_code)]
pub fn empty_array() -> PhpArray {
    PhpArray::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_int_parses_leading_numeric_prefix() {
        assert_eq!(Value::String("42abc".into()).to_int(), 42);
        assert_eq!(Value::String("  -3.5e2xyz".into()).to_int(), -350);
        assert_eq!(Value::String("abc".into()).to_int(), 0);
        assert_eq!(Value::String("".into()).to_int(), 0);
    }

    #[test]
    fn to_bool_matches_php_falsy_set() {
        assert!(!Value::Int(0).to_bool());
        assert!(!Value::Float(0.0).to_bool());
        assert!(!Value::String(String::new()).to_bool());
        assert!(!Value::String("0".into()).to_bool());
        assert!(Value::String("0.0".into()).to_bool());
        assert!(!Value::new_array().to_bool());
    }

    #[test]
    fn loose_vs_strict_numeric_string() {
        let a = Value::String("2".into());
        let b = Value::Int(2);
        assert!(a.loose_equals(&b));
        assert!(!a.strict_equals(&b));
    }

    #[test]
    fn array_loose_equals_ignores_order_of_comparison_args() {
        let mut a = PhpArray::new();
        a.set(ArrayKey::Str("x".into()), Value::Int(1));
        let mut b = PhpArray::new();
        b.set(ArrayKey::Str("x".into()), Value::String("1".into()));
        assert!(Value::Array(a).loose_equals(&Value::Array(b)));
    }
}

//! Array keys for `PhpArray`.
//!
//! PHP-like arrays key on either an integer or a string, with integer-looking
//! string keys silently folding to their integer form on insert (`"3"` and
//! `3` address the same slot). That folding lives in [`ArrayKey::from_value`]
//! and [`ArrayKey::normalize`].

use crate::value::Value;
use std::fmt;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Int(i64),
    Str(String),
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(n) => write!(f, "{n}"),
            ArrayKey::Str(s) => write!(f, "{s}"),
        }
    }
}

impl ArrayKey {
    /// Canonical-decimal check used both here and by `ArraySet`/`ArrayGet`:
    /// a string key that round-trips through `i64` parsing and back to the
    /// same text is treated as its integer form.
    fn string_is_canonical_int(s: &str) -> Option<i64> {
        let n: i64 = s.parse().ok()?;
        if n.to_string() == s {
            Some(n)
        } else {
            None
        }
    }

    /// Normalize a string key per the canonical-integer-string rule.
    pub fn normalize_str(s: &str) -> ArrayKey {
        match Self::string_is_canonical_int(s) {
            Some(n) => ArrayKey::Int(n),
            None => ArrayKey::Str(s.to_string()),
        }
    }

    /// Derive a key from an arbitrary `Value`, per §4.1 `ArrayGet`/`ArraySet`.
    pub fn from_value(value: &Value) -> ArrayKey {
        match value {
            Value::Int(n) => ArrayKey::Int(*n),
            Value::Float(f) => ArrayKey::Int(*f as i64),
            Value::Bool(b) => ArrayKey::Int(if *b { 1 } else { 0 }),
            Value::Null => ArrayKey::Str(String::new()),
            Value::String(s) => Self::normalize_str(s),
            other => ArrayKey::Str(other.to_string_lossy()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ArrayKey::Int(n) => Value::Int(*n),
            ArrayKey::Str(s) => Value::String(s.clone()),
        }
    }
}

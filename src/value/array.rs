//! `PhpArray`: the ordered, heterogeneously-keyed mapping backing `Value::Array`.
//!
//! Insertion order is iteration order. Integer keys advance a running
//! `next_auto_index` used by append (`ArraySet` with no key, `ArrayAppend`,
//! `AddArrayUnpack`).

use crate::value::{ArrayKey, Value};
use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub struct PhpArray {
    entries: IndexMap<ArrayKey, Value>,
    next_auto_index: i64,
}

impl PhpArray {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            next_auto_index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &ArrayKey) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &ArrayKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert at an explicit key; advances `next_auto_index` if the key is
    /// an integer `>= next_auto_index`, per spec §4.1 `ArraySet`.
    pub fn set(&mut self, key: ArrayKey, value: Value) {
        if let ArrayKey::Int(n) = key {
            if n >= self.next_auto_index {
                self.next_auto_index = n + 1;
            }
        }
        self.entries.insert(key, value);
    }

    /// Append using the running auto-index (a `null` key in `ArraySet`).
    pub fn append(&mut self, value: Value) -> ArrayKey {
        let key = ArrayKey::Int(self.next_auto_index);
        self.next_auto_index += 1;
        self.entries.insert(key.clone(), value);
        key
    }

    pub fn remove(&mut self, key: &ArrayKey) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, ArrayKey, Value> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ArrayKey> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    pub fn get_index(&self, index: usize) -> Option<(&ArrayKey, &Value)> {
        self.entries.get_index(index)
    }

    pub fn next_auto_index(&self) -> i64 {
        self.next_auto_index
    }

    /// Re-index every integer key starting at 0, preserving insertion order.
    /// Used by `ArrayValues`.
    pub fn values_reindexed(&self) -> PhpArray {
        let mut out = PhpArray::new();
        for v in self.entries.values() {
            out.append(v.clone());
        }
        out
    }

    /// Collect keys as a fresh array with sequential integer keys 0..n-1.
    /// Used by `ArrayKeys`.
    pub fn keys_as_array(&self) -> PhpArray {
        let mut out = PhpArray::new();
        for k in self.entries.keys() {
            out.append(k.to_value());
        }
        out
    }
}

impl PartialEq for PhpArray {
    fn eq(&self, other: &Self) -> bool {
        // Structural, key-order-insensitive identity check used by strict
        // array comparison; loose array comparison lives in coercion.rs
        // because it needs `Value::loose_equals`, not `PartialEq`.
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.entries.get(k) == Some(v))
    }
}

impl FromIterator<(ArrayKey, Value)> for PhpArray {
    fn from_iter<T: IntoIterator<Item = (ArrayKey, Value)>>(iter: T) -> Self {
        let mut arr = PhpArray::new();
        for (k, v) in iter {
            arr.set(k, v);
        }
        arr
    }
}

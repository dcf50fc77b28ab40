//! Object instances.
//!
//! PHP-like objects are handle/reference semantics: assigning an object
//! variable shares the instance rather than copying it. `Value::Object`
//! wraps `ObjectInstance` in `Rc<RefCell<_>>` so that two slots holding "the
//! same object" really do observe each other's property writes; `Clone` (the
//! opcode) is the only operation that produces an independent instance.

use crate::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
pub struct ObjectInstance {
    pub id: u64,
    pub class_name: String,
    pub properties: IndexMap<String, Value>,
    /// True once a constructor has run to completion, used by `CallCtor`'s
    /// bookkeeping and by reflection-ish diagnostics; not load-bearing for
    /// any opcode's *semantics* in this spec.
    pub constructed: bool,
}

pub type ObjectHandle = Rc<RefCell<ObjectInstance>>;

impl ObjectInstance {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            class_name: class_name.into(),
            properties: IndexMap::new(),
            constructed: false,
        }
    }

    pub fn new_handle(class_name: impl Into<String>) -> ObjectHandle {
        Rc::new(RefCell::new(Self::new(class_name)))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }

    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.properties.shift_remove(name)
    }

    /// Deep-copy this instance (new id, properties cloned recursively
    /// through nested arrays/objects) for the `Clone` opcode.
    pub fn deep_clone(&self) -> ObjectInstance {
        let mut properties = IndexMap::new();
        for (k, v) in &self.properties {
            properties.insert(k.clone(), v.deep_clone());
        }
        ObjectInstance {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            class_name: self.class_name.clone(),
            properties,
            constructed: self.constructed,
        }
    }
}

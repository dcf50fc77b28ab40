//! Callable values: named-function references and closures.

use crate::instruction::CompiledFunction;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum CallableValue {
    /// A bare function name, resolved against the registry at call time.
    Named(String),
    /// A closure: captured locals plus an optional bound `$this`.
    Closure(Rc<ClosureData>),
}

#[derive(Debug)]
pub struct ClosureData {
    pub function: Rc<CompiledFunction>,
    pub bound_this: Option<Value>,
    pub captured: HashMap<u32, Value>,
}

impl CallableValue {
    /// The literal name used by `InitFCall` when resolving what's being
    /// called: a closure reports `"__closure__"`, a plain named reference
    /// reports its own name.
    pub fn display_name(&self) -> String {
        match self {
            CallableValue::Named(name) => name.clone(),
            CallableValue::Closure(_) => "__closure__".to_string(),
        }
    }
}

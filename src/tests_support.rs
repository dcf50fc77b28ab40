//! Minimal no-op collaborator implementations shared by unit tests across
//! the crate. Not part of the public API.

use crate::error::VmError;
use crate::hooks::{BuiltinBridge, IncludeReader};
use crate::registry::{ClassDescriptor, Registry};
use crate::instruction::CompiledFunction;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
pub struct NullRegistry {
    pub functions: HashMap<String, Rc<CompiledFunction>>,
    pub classes: HashMap<String, Rc<ClassDescriptor>>,
    pub constants: HashMap<String, Value>,
    pub statics: HashMap<(String, String), Value>,
}

impl Registry for NullRegistry {
    fn function(&self, name: &str) -> Option<Rc<CompiledFunction>> {
        self.functions.get(&name.to_ascii_lowercase()).cloned()
    }

    fn class(&self, name: &str) -> Option<Rc<ClassDescriptor>> {
        self.classes.get(&name.to_ascii_lowercase()).cloned()
    }

    fn method(&self, class_name: &str, method_name: &str) -> Option<Rc<CompiledFunction>> {
        self.functions
            .get(&format!("{}::{}", class_name.to_ascii_lowercase(), method_name.to_ascii_lowercase()))
            .cloned()
    }

    fn global_constant(&self, name: &str) -> Option<Value> {
        self.constants.get(name).cloned()
    }

    fn static_property(&self, class_name: &str, prop_name: &str) -> Option<Value> {
        self.statics.get(&(class_name.to_string(), prop_name.to_string())).cloned()
    }

    fn set_static_property(&mut self, class_name: &str, prop_name: &str, value: Value) {
        self.statics.insert((class_name.to_string(), prop_name.to_string()), value);
    }

    fn unset_static_property(&mut self, class_name: &str, prop_name: &str) {
        self.statics.remove(&(class_name.to_string(), prop_name.to_string()));
    }
}

#[derive(Default)]
pub struct NullBridge;

impl BuiltinBridge for NullBridge {
    fn call_builtin(&mut self, name: &str, _args: &[Value]) -> Result<Value, VmError> {
        Err(VmError::lookup(format!("no such built-in function {name}")))
    }

    fn has_builtin(&self, _name: &str) -> bool {
        false
    }
}

#[derive(Default)]
pub struct NullIncludes;

impl IncludeReader for NullIncludes {
    fn read(&self, path: &str) -> std::io::Result<String> {
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))
    }
}

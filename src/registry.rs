//! The registry interface (component C6): everything the dispatch loop
//! needs to know about classes, functions, constants, and statics, but
//! doesn't own itself. Opcode handlers reach the host program through this
//! trait only — never by poking at some global table directly.
//!
//! The shape of `ClassDescriptor`/`PropertyDescriptor` is adapted from the
//! teacher's class-compilation records, minus anything that depended on an
//! AST (parsing is out of scope here; a registry implementation is expected
//! to have already turned source into these descriptors before the VM ever
//! sees them).

use crate::instruction::CompiledFunction;
use crate::value::Value;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub is_static: bool,
    pub default: Value,
}

#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    pub name: String,
    pub is_abstract: bool,
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    pub properties: Vec<PropertyDescriptor>,
    pub constants: Vec<(String, Value)>,
    /// Dynamic property creation (assigning to an undeclared property name)
    /// is allowed unless the class opts out; see `ObjectSet` in `SPEC_FULL.md`.
    pub allows_dynamic_properties: bool,
}

impl ClassDescriptor {
    /// Walk `parent` links; does not consult the registry for the parent's
    /// own descriptor, so callers loop via `Registry::class` themselves.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.interfaces.iter().any(|i| i.eq_ignore_ascii_case(name))
    }
}

/// Host-provided lookups the dispatch loop needs but does not own.
/// Implementations back this with whatever class/function tables the
/// surrounding program maintains; this crate only ever calls through it.
pub trait Registry {
    fn function(&self, name: &str) -> Option<Rc<CompiledFunction>>;

    fn class(&self, name: &str) -> Option<Rc<ClassDescriptor>>;

    fn method(&self, class_name: &str, method_name: &str) -> Option<Rc<CompiledFunction>>;

    /// Full ancestor/interface chain, nearest first, for `InstanceOf` and
    /// class-constant/static-property resolution.
    fn class_chain(&self, class_name: &str) -> Vec<Rc<ClassDescriptor>> {
        let mut out = Vec::new();
        let mut current = self.class(class_name);
        while let Some(desc) = current {
            let parent = desc.parent.clone();
            out.push(desc);
            current = parent.and_then(|p| self.class(&p));
        }
        out
    }

    fn instance_of(&self, class_name: &str, target: &str) -> bool {
        self.class_chain(class_name).iter().any(|d| d.is(target))
    }

    fn global_constant(&self, name: &str) -> Option<Value>;

    fn static_property(&self, class_name: &str, prop_name: &str) -> Option<Value>;

    fn set_static_property(&mut self, class_name: &str, prop_name: &str, value: Value);

    /// Delete the static property outright, distinct from `set_static_property(.., Null)`
    /// so a registry that tracks "present but Null" separately from "absent"
    /// reports the right state afterward (`FetchStaticPropUnset`, §4.5.10).
    fn unset_static_property(&mut self, class_name: &str, prop_name: &str);
}

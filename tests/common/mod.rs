//! Shared harness for integration tests: minimal collaborator
//! implementations plus a builder for a single-function `Machine` run,
//! mirroring the per-module `harness()` helpers used by the crate's own
//! unit tests but assembled from the public API only.

use std::collections::HashMap;
use std::rc::Rc;

use vhp_core::{CompiledFunction, ExecutionContext, Instruction, Value, VmConfig};

#[derive(Default)]
pub struct NullRegistry {
    pub functions: HashMap<String, Rc<CompiledFunction>>,
    pub classes: HashMap<String, Rc<vhp_core::registry::ClassDescriptor>>,
    pub constants: HashMap<String, Value>,
    pub statics: HashMap<(String, String), Value>,
}

impl vhp_core::registry::Registry for NullRegistry {
    fn function(&self, name: &str) -> Option<Rc<CompiledFunction>> {
        self.functions.get(&name.to_ascii_lowercase()).cloned()
    }

    fn class(&self, name: &str) -> Option<Rc<vhp_core::registry::ClassDescriptor>> {
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

impl vhp_core::hooks::BuiltinBridge for NullBridge {
    fn call_builtin(&mut self, name: &str, _args: &[Value]) -> Result<Value, vhp_core::VmError> {
        Err(vhp_core::VmError::lookup(format!("no such built-in function {name}")))
    }

    fn has_builtin(&self, _name: &str) -> bool {
        false
    }
}

#[derive(Default)]
pub struct NullIncludes;

impl vhp_core::hooks::IncludeReader for NullIncludes {
    fn read(&self, path: &str) -> std::io::Result<String> {
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))
    }
}

/// An `IncludeReader` backed by an in-memory path -> contents table, for
/// exercising `Include`/`Require` without touching a real filesystem.
#[derive(Default)]
pub struct FakeIncludes {
    pub files: HashMap<String, String>,
}

impl FakeIncludes {
    pub fn with(path: impl Into<String>, contents: impl Into<String>) -> Self {
        let mut files = HashMap::new();
        files.insert(path.into(), contents.into());
        Self { files }
    }
}

impl vhp_core::hooks::IncludeReader for FakeIncludes {
    fn read(&self, path: &str) -> std::io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))
    }

    fn canonicalize(&self, path: &str) -> std::io::Result<std::path::PathBuf> {
        Ok(std::path::PathBuf::from(path))
    }
}

/// A function with no parameters, `num_locals` locals and `num_temporaries`
/// temporaries, running `instructions` against `constants`.
pub fn function(
    instructions: Vec<Instruction>,
    constants: Vec<Value>,
    num_locals: u32,
    num_temporaries: u32,
) -> Rc<CompiledFunction> {
    Rc::new(CompiledFunction {
        name: "main".into(),
        instructions,
        constants,
        params: vec![],
        is_variadic: false,
        is_generator: false,
        num_locals,
        num_temporaries,
        var_slot_names: vec![],
    })
}

pub fn generator_function(
    instructions: Vec<Instruction>,
    constants: Vec<Value>,
    num_locals: u32,
    num_temporaries: u32,
) -> Rc<CompiledFunction> {
    Rc::new(CompiledFunction {
        name: "gen".into(),
        instructions,
        constants,
        params: vec![],
        is_variadic: false,
        is_generator: true,
        num_locals,
        num_temporaries,
        var_slot_names: vec![],
    })
}

/// Bundles the owned collaborators a `Machine` borrows from, so a test can
/// build them once and then construct (possibly several) short-lived
/// `Machine` borrows against the same state.
pub struct Harness {
    pub ctx: ExecutionContext<Vec<u8>>,
    pub registry: NullRegistry,
    pub bridge: NullBridge,
    pub includes: NullIncludes,
    pub config: VmConfig,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            ctx: ExecutionContext::new(Vec::new()),
            registry: NullRegistry::default(),
            bridge: NullBridge::default(),
            includes: NullIncludes::default(),
            config: VmConfig::default(),
        }
    }

    pub fn machine(&mut self) -> vhp_core::Machine<'_, Vec<u8>> {
        vhp_core::Machine {
            ctx: &mut self.ctx,
            registry: &mut self.registry,
            bridge: &mut self.bridge,
            includes: &self.includes,
            config: &self.config,
            #[cfg(feature = "debug-hooks")]
            observer: None,
        }
    }
}

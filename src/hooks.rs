//! External collaborator hooks (C7) and the optional debug/profile
//! accessory hooks (C8).
//!
//! Everything here is a trait the host implements; the dispatch loop and
//! opcode handlers only ever call through these, never reach into a
//! filesystem or a builtin-function table directly. This is the seam that
//! keeps the execution core testable without a real filesystem or a real
//! builtin-function library behind it.

use crate::error::VmError;
use crate::instruction::Instruction;
use crate::value::Value;

/// Reads include/require targets. A host backed by the real filesystem
/// returns file contents as source text pre-compiled to a `CompiledFunction`
/// elsewhere; this trait only deals with the read, matching the teacher's
/// `file_get_contents`-style non-fatal-on-failure convention (`Include`
/// treats a read failure as a warning-and-`false`, never a fatal).
pub trait IncludeReader {
    fn read(&self, path: &str) -> std::io::Result<String>;

    /// Canonicalize before the `IncludeOnce`/`RequireOnce` set-membership
    /// check, so `"./a.php"` and `"a.php"` are recognized as the same file.
    fn canonicalize(&self, path: &str) -> std::io::Result<std::path::PathBuf> {
        std::fs::canonicalize(path)
    }
}

/// Dispatches calls into the built-in function library (string/array/math
/// functions not modeled as opcodes, `__toString` invocation, and so on).
/// Kept separate from `Registry` because these are *callable* at runtime
/// rather than *looked up* as compiled metadata.
pub trait BuiltinBridge {
    fn call_builtin(&mut self, name: &str, args: &[Value]) -> Result<Value, VmError>;

    fn has_builtin(&self, name: &str) -> bool;
}

/// Optional, zero-cost-when-unused observation of the dispatch loop —
/// single-stepping debuggers and profilers hang off this. Compiled out
/// entirely unless the `debug-hooks` feature is enabled.
#[cfg(feature = "debug-hooks")]
pub trait VmObserver {
    fn on_instruction(&mut self, _ip: u32, _instruction: &Instruction) {}
    fn on_call_enter(&mut self, _function_name: &str) {}
    fn on_call_exit(&mut self, _function_name: &str) {}
    fn on_suppressed_error(&mut self, _message: &str) {}
}

#[cfg(feature = "debug-hooks")]
#[derive(Debug, Default)]
pub struct CountingObserver {
    pub instructions_executed: u64,
    pub calls_entered: u64,
    pub suppressed_errors: u64,
}

#[cfg(feature = "debug-hooks")]
impl VmObserver for CountingObserver {
    fn on_instruction(&mut self, _ip: u32, _instruction: &Instruction) {
        self.instructions_executed += 1;
    }

    fn on_call_enter(&mut self, _function_name: &str) {
        self.calls_entered += 1;
    }

    fn on_suppressed_error(&mut self, _message: &str) {
        self.suppressed_errors += 1;
    }
}

#[cfg(all(test, feature = "debug-hooks"))]
mod tests {
    use super::*;
    use crate::instruction::{Instruction, Opcode};

    #[test]
    fn counting_observer_counts_instructions() {
        let mut obs = CountingObserver::default();
        let instr = Instruction {
            opcode: Opcode::Nop,
            op1: 0,
            op2: 0,
            result: 0,
            op_type1: 0,
            op_type2: 0,
            reserved: 0,
        };
        obs.on_instruction(0, &instr);
        obs.on_instruction(1, &instr);
        assert_eq!(obs.instructions_executed, 2);
    }
}

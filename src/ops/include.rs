//! §4.5.14 include/require. `Op1` names a path (constant or computed);
//! `once`/`required` select among the four opcodes sharing this one
//! handler, per the spec's own framing of `IncludeOnce`/`RequireOnce` as
//! `Include`/`Require` plus a once-check.

use crate::dispatch::Machine;
use crate::error::{OpResult, VmError};
use crate::instruction::Instruction;
use crate::value::Value;
use std::io::Write;
use std::path::PathBuf;

pub fn exec_include<W: Write>(m: &mut Machine<W>, instr: &Instruction, once: bool, required: bool) -> OpResult {
    let path_value = m.read(instr.op1, instr.op1_kind());
    let path = m.stringify(&path_value)?;

    let canonical = m
        .includes
        .canonicalize(&path)
        .unwrap_or_else(|_| PathBuf::from(&path));

    if once && m.ctx.included_files.contains(&canonical) {
        m.write(instr.result, instr.result_kind(), Value::Bool(true));
        return Ok(None);
    }

    match m.includes.read(&path) {
        Ok(contents) => {
            let size = contents.len() as i64;
            m.ctx.included_files.insert(canonical);
            m.write(instr.result, instr.result_kind(), Value::Int(size));
            Ok(None)
        }
        Err(e) => {
            if required {
                Err(VmError::fatal(format!("require(): Failed opening required '{path}': {e}")))
            } else {
                if !m.ctx.is_silenced() {
                    m.ctx.warn(&format!("include(): Failed opening '{path}' for inclusion: {e}"));
                }
                m.write(instr.result, instr.result_kind(), Value::Bool(false));
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VmConfig;
    use crate::context::{CallFrame, ExecutionContext};
    use crate::hooks::IncludeReader;
    use crate::instruction::{CompiledFunction, OperandKind, Opcode};
    use crate::tests_support::{NullBridge, NullIncludes, NullRegistry};
    use std::rc::Rc;

    struct FakeIncludes;

    impl IncludeReader for FakeIncludes {
        fn read(&self, path: &str) -> std::io::Result<String> {
            if path == "helpers.php" {
                Ok("<?php // nine bytes".to_string())
            } else {
                Err(std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))
            }
        }

        fn canonicalize(&self, path: &str) -> std::io::Result<PathBuf> {
            Ok(PathBuf::from(path))
        }
    }

    fn harness_with(path: &str) -> (ExecutionContext<Vec<u8>>, NullRegistry, NullBridge, VmConfig, Instruction) {
        let mut ctx = ExecutionContext::new(Vec::new());
        let function = Rc::new(CompiledFunction {
            name: "main".into(),
            instructions: vec![],
            constants: vec![Value::String(path.to_string())],
            params: vec![],
            is_variadic: false,
            is_generator: false,
            num_locals: 1,
            num_temporaries: 1,
            var_slot_names: vec![],
        });
        ctx.call_stack.push(CallFrame::new(function, None, None));
        let instr = Instruction {
            opcode: Opcode::Include,
            op1: 0,
            op2: 0,
            result: 0,
            op_type1: crate::instruction::encode_op_types(OperandKind::Const, OperandKind::Unused),
            op_type2: crate::instruction::encode_result_type(OperandKind::TmpVar),
            reserved: 0,
        };
        (ctx, NullRegistry::default(), NullBridge::default(), VmConfig::default(), instr)
    }

    #[test]
    fn successful_include_reports_byte_length() {
        let (mut ctx, mut reg, mut bridge, config, instr) = harness_with("helpers.php");
        let includes = FakeIncludes;
        let mut m = Machine {
            ctx: &mut ctx,
            registry: &mut reg,
            bridge: &mut bridge,
            includes: &includes,
            config: &config,
            #[cfg(feature = "debug-hooks")]
            observer: None,
        };
        exec_include(&mut m, &instr, false, false).unwrap();
        assert_eq!(m.read(0, OperandKind::TmpVar), Value::Int(19));
    }

    #[test]
    fn include_once_is_idempotent_for_the_same_canonical_path() {
        let (mut ctx, mut reg, mut bridge, config, instr) = harness_with("helpers.php");
        let includes = FakeIncludes;
        let mut m = Machine {
            ctx: &mut ctx,
            registry: &mut reg,
            bridge: &mut bridge,
            includes: &includes,
            config: &config,
            #[cfg(feature = "debug-hooks")]
            observer: None,
        };
        exec_include(&mut m, &instr, true, false).unwrap();
        assert_eq!(m.read(0, OperandKind::TmpVar), Value::Int(19));
        exec_include(&mut m, &instr, true, false).unwrap();
        assert_eq!(m.read(0, OperandKind::TmpVar), Value::Bool(true));
    }

    #[test]
    fn missing_include_reports_false_without_erroring() {
        let (mut ctx, mut reg, mut bridge, config, instr) = harness_with("missing.php");
        let includes = NullIncludes;
        let mut m = Machine {
            ctx: &mut ctx,
            registry: &mut reg,
            bridge: &mut bridge,
            includes: &includes,
            config: &config,
            #[cfg(feature = "debug-hooks")]
            observer: None,
        };
        exec_include(&mut m, &instr, false, false).unwrap();
        assert_eq!(m.read(0, OperandKind::TmpVar), Value::Bool(false));
    }

    #[test]
    fn missing_require_is_fatal_and_names_require() {
        let (mut ctx, mut reg, mut bridge, config, instr) = harness_with("missing.php");
        let includes = NullIncludes;
        let mut m = Machine {
            ctx: &mut ctx,
            registry: &mut reg,
            bridge: &mut bridge,
            includes: &includes,
            config: &config,
            #[cfg(feature = "debug-hooks")]
            observer: None,
        };
        let err = exec_include(&mut m, &instr, false, true).unwrap_err();
        assert!(err.to_string().contains("require("));
    }
}

//! §4.5.16 error suppression (the `@` operator). Paired opcodes bracket the
//! suppressed expression; `Result` reports the suppression state rather
//! than anything derived from the expression itself, so the compiler can
//! use it as a simple marker if it wants one.

use crate::dispatch::Machine;
use crate::error::OpResult;
use crate::instruction::Instruction;
use crate::value::Value;
use std::io::Write;

pub fn exec_begin_silence<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    m.ctx.begin_silence();
    m.write(instr.result, instr.result_kind(), Value::Bool(true));
    Ok(None)
}

pub fn exec_end_silence<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    m.ctx.end_silence();
    m.write(instr.result, instr.result_kind(), Value::Bool(false));
    Ok(None)
}

//! §4.5.13 rope buffers: multi-segment string concatenation staged in
//! `ExecutionContext::rope_buffers` rather than built one `Concat` at a
//! time, so a chain of `.`-joined operands costs one allocation instead of
//! one per intermediate. `RopeInit`'s `Result` and `RopeAdd`/`RopeEnd`'s
//! `Op1` carry the buffer id as a raw number (like `BindGlobal`'s `Op2`),
//! not a decoded value operand — they address a buffer, not a value.

use crate::dispatch::Machine;
use crate::error::OpResult;
use crate::instruction::Instruction;
use crate::value::Value;
use std::io::Write;

pub fn exec_rope_init<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let first = m.read(instr.op1, instr.op1_kind());
    let text = m.stringify(&first)?;
    let buf_id = instr.result;
    m.ctx.rope_buffers.insert(buf_id, vec![text]);
    Ok(None)
}

pub fn exec_rope_add<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let buf_id = instr.op1;
    let segment = m.read(instr.op2, instr.op2_kind());
    let text = m.stringify(&segment)?;
    m.ctx.rope_buffers.entry(buf_id).or_default().push(text);
    Ok(None)
}

/// Concatenates and removes the buffer; a `RopeEnd` with no matching
/// `RopeInit` (buffer never allocated, or already consumed) yields `""`
/// rather than erroring.
pub fn exec_rope_end<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let buf_id = instr.op1;
    let joined = m.ctx.rope_buffers.remove(&buf_id).map(|segs| segs.concat()).unwrap_or_default();
    m.write(instr.result, instr.result_kind(), Value::String(joined));
    Ok(None)
}

pub fn exec_fast_concat<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let left = m.read(instr.op1, instr.op1_kind());
    let right = m.read(instr.op2, instr.op2_kind());
    let left = m.stringify(&left)?;
    let right = m.stringify(&right)?;
    m.write(instr.result, instr.result_kind(), Value::String(left + &right));
    Ok(None)
}

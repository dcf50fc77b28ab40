//! §4.5.12 string primitives compiled as opcodes rather than builtin-bridge
//! calls — frequent enough (string length checks, case folding in
//! comparisons) that the teacher's own `execute_concat` precedent (plain
//! opcode, no bridge round-trip) extends naturally to this family.
//! Byte-oriented throughout, matching the string model's own byte-length
//! `Count`/`strlen` convention rather than a codepoint count.

use crate::dispatch::Machine;
use crate::error::OpResult;
use crate::instruction::Instruction;
use crate::value::Value;
use std::io::Write;

pub fn exec_strlen<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let v = m.read(instr.op1, instr.op1_kind());
    let s = m.stringify(&v)?;
    m.write(instr.result, instr.result_kind(), Value::Int(s.len() as i64));
    Ok(None)
}

/// Negative `start` counts back from the end, clamped to the start of the
/// string rather than erroring.
pub fn exec_substr<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let v = m.read(instr.op1, instr.op1_kind());
    let s = m.stringify(&v)?;
    let start_raw = m.read(instr.op2, instr.op2_kind()).to_int();
    let bytes = s.as_bytes();
    let len = bytes.len() as i64;
    let start = if start_raw < 0 { (len + start_raw).max(0) } else { start_raw.min(len) };
    let result = String::from_utf8_lossy(&bytes[start as usize..]).into_owned();
    m.write(instr.result, instr.result_kind(), Value::String(result));
    Ok(None)
}

/// Byte-offset search; an empty needle matches at position 0, matching the
/// builtin function library's own `strpos("", "")` convention.
pub fn exec_strpos<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let haystack_value = m.read(instr.op1, instr.op1_kind());
    let haystack = m.stringify(&haystack_value)?;
    let needle_value = m.read(instr.op2, instr.op2_kind());
    let needle = m.stringify(&needle_value)?;
    let result = if needle.is_empty() {
        Value::Int(0)
    } else {
        match haystack.as_bytes().windows(needle.len()).position(|w| w == needle.as_bytes()) {
            Some(pos) => Value::Int(pos as i64),
            None => Value::Bool(false),
        }
    };
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

pub fn exec_strtolower<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let v = m.read(instr.op1, instr.op1_kind());
    let s = m.stringify(&v)?;
    m.write(instr.result, instr.result_kind(), Value::String(s.to_ascii_lowercase()));
    Ok(None)
}

pub fn exec_strtoupper<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let v = m.read(instr.op1, instr.op1_kind());
    let s = m.stringify(&v)?;
    m.write(instr.result, instr.result_kind(), Value::String(s.to_ascii_uppercase()));
    Ok(None)
}

//! §4.5.4 array builtins plus the plain `FetchDim*`/`InitArray` primitives a
//! register machine needs for ordinary `$arr[$key]` reads and array-literal
//! construction (supplemented per `SPEC_FULL.md` §4).

use crate::dispatch::Machine;
use crate::error::{OpResult, VmError};
use crate::instruction::Instruction;
use crate::value::{ArrayKey, Value};
use std::io::Write;

pub fn exec_fetch_dim<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let container = m.read(instr.op1, instr.op1_kind());
    let key = m.read(instr.op2, instr.op2_kind());
    let result = container.array_get(&key);
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

pub fn exec_init_array<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    m.write(instr.result, instr.result_kind(), Value::new_array());
    Ok(None)
}

pub fn exec_array_key_exists<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let key = m.read(instr.op1, instr.op1_kind());
    let arr = m.read(instr.op2, instr.op2_kind());
    let result = match arr.deref() {
        Value::Array(arr) => arr.contains_key(&ArrayKey::from_value(&key.deref())),
        _ => false,
    };
    m.write(instr.result, instr.result_kind(), Value::Bool(result));
    Ok(None)
}

pub fn exec_count<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    let count = match value.deref() {
        Value::Null => 0,
        Value::String(s) => s.len() as i64,
        Value::Array(arr) => arr.len() as i64,
        _ => 0,
    };
    m.write(instr.result, instr.result_kind(), Value::Int(count));
    Ok(None)
}

pub fn exec_in_array<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let needle = m.read(instr.op1, instr.op1_kind());
    let haystack = m.read(instr.op2, instr.op2_kind());
    let result = match haystack.deref() {
        Value::Array(arr) => arr.values().any(|v| v.loose_equals(&needle)),
        _ => false,
    };
    m.write(instr.result, instr.result_kind(), Value::Bool(result));
    Ok(None)
}

pub fn exec_array_values<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    let result = match value.deref() {
        Value::Array(arr) => Value::Array(arr.values_reindexed()),
        _ => Value::new_array(),
    };
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

pub fn exec_array_keys<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    let result = match value.deref() {
        Value::Array(arr) => Value::Array(arr.keys_as_array()),
        _ => Value::new_array(),
    };
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

/// Union of two arrays: string keys from the right overwrite the left;
/// integer-keyed elements are re-indexed through the merged auto-index
/// sequence (append order: all of the left's values, then the right's).
pub fn exec_array_merge<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let left = m.read(instr.op1, instr.op1_kind());
    let right = m.read(instr.op2, instr.op2_kind());
    let mut out = crate::value::PhpArray::new();
    if let Value::Array(left) = left.deref() {
        for (k, v) in left.iter() {
            match k {
                ArrayKey::Int(_) => {
                    out.append(v.clone());
                }
                ArrayKey::Str(s) => out.set(ArrayKey::Str(s.clone()), v.clone()),
            }
        }
    }
    if let Value::Array(right) = right.deref() {
        for (k, v) in right.iter() {
            match k {
                ArrayKey::Int(_) => {
                    out.append(v.clone());
                }
                ArrayKey::Str(s) => out.set(ArrayKey::Str(s.clone()), v.clone()),
            }
        }
    }
    m.write(instr.result, instr.result_kind(), Value::Array(out));
    Ok(None)
}

/// `Result` doubles as both the unpack target and the output — it is read
/// for the array being appended into, then written back with the merged
/// contents, per §4.5.15.
pub fn exec_add_array_unpack<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let src = m.read(instr.op1, instr.op1_kind());
    let target = m.read(instr.result, instr.result_kind());
    let mut out = match target.deref() {
        Value::Array(arr) => arr,
        other => {
            return Err(VmError::type_error(format!(
                "cannot unpack into a value of type {}",
                other.get_type()
            )))
        }
    };
    if let Value::Array(src) = src.deref() {
        for (k, v) in src.iter() {
            match k {
                ArrayKey::Int(_) => {
                    out.append(v.clone());
                }
                ArrayKey::Str(s) => out.set(ArrayKey::Str(s.clone()), v.clone()),
            }
        }
    }
    m.write(instr.result, instr.result_kind(), Value::Array(out));
    Ok(None)
}

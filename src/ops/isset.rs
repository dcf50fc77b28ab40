//! §4.5.11 isset/empty/unset family. "Defined" collapses to "not absent",
//! and since an absent slot reads as `Null` here (per spec §3.1's operand
//! invariant), these all boil down to a not-null check on whatever the
//! corresponding `Fetch*` would have returned.

use crate::dispatch::Machine;
use crate::error::OpResult;
use crate::instruction::Instruction;
use crate::value::{ArrayKey, Value};
use std::io::Write;

pub fn exec_isset_var<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    m.write(instr.result, instr.result_kind(), Value::Bool(!value.is_null()));
    Ok(None)
}

pub fn exec_isset_dim<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let arr = m.read(instr.op1, instr.op1_kind());
    let key = m.read(instr.op2, instr.op2_kind());
    let result = !arr.array_get(&key).is_null();
    m.write(instr.result, instr.result_kind(), Value::Bool(result));
    Ok(None)
}

pub fn exec_isset_prop<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let target = m.read(instr.op1, instr.op1_kind());
    let prop = m.read(instr.op2, instr.op2_kind());
    let result = match target.deref() {
        Value::Object(obj) => obj
            .borrow()
            .get(&prop.to_string_lossy())
            .map(|v| !v.is_null())
            .unwrap_or(false),
        _ => false,
    };
    m.write(instr.result, instr.result_kind(), Value::Bool(result));
    Ok(None)
}

/// `Unset(slot)`: our flat slot storage can't truly remove a binding, so
/// unsetting a local resets it to `Null`, the value absence collapses to
/// anyway on read.
pub fn exec_unset<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    m.write(instr.op1, instr.op1_kind(), Value::Null);
    Ok(None)
}

pub fn exec_fetch_dim_unset<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let container = m.read(instr.op1, instr.op1_kind());
    let key = m.read(instr.op2, instr.op2_kind());
    if let Value::Array(mut arr) = container.deref() {
        arr.remove(&ArrayKey::from_value(&key.deref()));
        m.write(instr.op1, instr.op1_kind(), Value::Array(arr));
    }
    Ok(None)
}

//! `foreach` lowering, implicit in the compiler's output per spec §4. This
//! follows the familiar reset/fetch-or-jump/fetch-key/free shape: `Op1` on
//! `ForeachReset`/`ForeachFetch`/`ForeachFetchKey`/`ForeachFree` names a
//! cursor slot directly (like `BindGlobal`'s `Op2`), not through the
//! operand-kind table, since it addresses a live iterator rather than a
//! value.
//!
//! Compiled shape:
//! ```text
//! ForeachReset container -> slot          ; Result := has-any-entries
//! loop:
//!   ForeachFetch slot, end -> tmpValue     ; jumps to `end` once exhausted
//!   ForeachFetchKey slot -> tmpKey         ; key of the entry just fetched
//!   ... body ...
//!   Jump loop
//! end:
//!   ForeachFree slot
//! ```

use crate::context::ForeachIterator;
use crate::dispatch::Machine;
use crate::error::OpResult;
use crate::instruction::Instruction;
use crate::value::Value;
use std::io::Write;

pub fn exec_foreach_reset<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let container = m.read(instr.op1, instr.op1_kind());
    let slot = instr.op2;
    let iterator = match container.deref() {
        Value::Array(arr) => ForeachIterator::from_array(&arr),
        _ => ForeachIterator::from_array(&crate::value::PhpArray::new()),
    };
    let has_entries = iterator.valid();
    m.ctx.foreach_iterators.insert(slot, iterator);
    m.write(instr.result, instr.result_kind(), Value::Bool(has_entries));
    Ok(None)
}

pub fn exec_foreach_fetch<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let slot = instr.op1;
    let exhausted = m.ctx.foreach_iterators.get(&slot).map(|it| !it.valid()).unwrap_or(true);
    if exhausted {
        m.ctx.frame_mut().ip = instr.op2;
        return Ok(None);
    }
    let (key, value) = m
        .ctx
        .foreach_iterators
        .get(&slot)
        .and_then(|it| it.current())
        .cloned()
        .expect("validity just checked above");
    if let Some(it) = m.ctx.foreach_iterators.get_mut(&slot) {
        it.last_key = Some(key);
        it.advance();
    }
    m.write(instr.result, instr.result_kind(), value);
    Ok(None)
}

pub fn exec_foreach_fetch_key<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let slot = instr.op1;
    let key = m
        .ctx
        .foreach_iterators
        .get(&slot)
        .and_then(|it| it.last_key.clone())
        .map(|k| k.to_value())
        .unwrap_or(Value::Null);
    m.write(instr.result, instr.result_kind(), key);
    Ok(None)
}

/// Drops the iterator and clears the two temporaries the compiler reserves
/// alongside it. Tolerates a missing iterator — a loop body that `break`s
/// before `ForeachReset` ever ran (or one already freed) should not fail.
pub fn exec_foreach_free<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let slot = instr.op1;
    m.ctx.foreach_iterators.remove(&slot);
    if let Some(t) = m.ctx.frame_mut().temporaries.get_mut(slot as usize) {
        *t = Value::Null;
    }
    if let Some(t) = m.ctx.frame_mut().temporaries.get_mut(slot as usize + 1) {
        *t = Value::Null;
    }
    Ok(None)
}

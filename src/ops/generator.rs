//! §4.5.8 generators. A generator body runs as an ordinary frame; `Yield`
//! and `YieldFrom` are the only opcodes that know they might be running
//! inside one, via `ExecutionContext::current_generator`. Outside that
//! context both degrade to a plain write-through, matching an expression
//! that's syntactically a `yield` but never actually suspends anything.

use crate::dispatch::Machine;
use crate::error::{OpResult, Signal};
use crate::instruction::{Instruction, OperandKind};
use crate::value::{ArrayKey, Value};
use std::io::Write;

use crate::context::YieldFromState;

pub fn exec_yield<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    if m.ctx.current_generator.is_none() {
        log::debug!("yield outside of a generator function; treating as a plain assignment");
        m.write(instr.result, instr.result_kind(), value);
        return Ok(None);
    }
    let key = match instr.op2_kind() {
        OperandKind::Unused => None,
        kind => Some(m.read(instr.op2, kind)),
    };
    let gen = m.ctx.current_generator.as_mut().expect("checked above");
    let key = key.unwrap_or_else(|| Value::Int(gen.next_auto_key()));
    gen.yielded_key = key;
    gen.yielded_value = value.clone();
    gen.suspended = true;
    gen.pending_result_slot = Some((instr.result, instr.result_kind()));
    Ok(Some(Signal::Yield(value)))
}

/// Delegates to every (key, value) pair of an array source in turn,
/// suspending once per element. The compiler re-emits this same
/// instruction on every resume (its `ip` never advances mid-sequence) —
/// `GeneratorState::yield_from` carries the cursor between calls, and the
/// instruction only falls through once the source is exhausted.
pub fn exec_yield_from<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    if m.ctx.current_generator.is_none() {
        m.write(instr.result, instr.result_kind(), Value::Null);
        return Ok(None);
    }
    let already_started = m.ctx.current_generator.as_ref().expect("checked above").yield_from.is_some();
    if !already_started {
        let source = m.read(instr.op1, instr.op1_kind());
        let entries: Vec<(ArrayKey, Value)> = match source.deref() {
            Value::Array(arr) => arr.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => Vec::new(),
        };
        m.ctx.current_generator.as_mut().expect("checked above").yield_from = Some(YieldFromState { entries, position: 0 });
    }

    let gen = m.ctx.current_generator.as_mut().expect("checked above");
    let state = gen.yield_from.as_mut().expect("just populated above");
    if state.position >= state.entries.len() {
        gen.yield_from = None;
        m.write(instr.result, instr.result_kind(), Value::Null);
        return Ok(None);
    }
    let (key, value) = state.entries[state.position].clone();
    state.position += 1;
    gen.yielded_key = key.to_value();
    gen.yielded_value = value.clone();
    gen.suspended = true;
    gen.pending_result_slot = Some((instr.result, instr.result_kind()));
    Ok(Some(Signal::Yield(value)))
}

pub fn exec_generator_return<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = match instr.op1_kind() {
        OperandKind::Unused => Value::Null,
        kind => m.read(instr.op1, kind),
    };
    Ok(Some(Signal::Return(value)))
}

//! §4.5.1 Output, return, exit.

use crate::dispatch::Machine;
use crate::error::{OpResult, Signal};
use crate::instruction::Instruction;
use crate::value::Value;
use std::io::Write;
use std::rc::Rc;

pub fn exec_echo<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    let text = m.stringify(&value)?;
    m.ctx.echo(&text)?;
    Ok(None)
}

pub fn exec_print<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    let text = m.stringify(&value)?;
    m.ctx.echo(&text)?;
    m.write(instr.result, instr.result_kind(), Value::Int(1));
    Ok(None)
}

pub fn exec_return<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    Ok(Some(Signal::Return(value)))
}

pub fn exec_return_by_ref<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    let cell = Rc::new(std::cell::RefCell::new(value));
    Ok(Some(Signal::Return(Value::Reference(cell))))
}

pub fn exec_exit<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    let code = match value.deref() {
        Value::Null if matches!(instr.op1_kind(), crate::instruction::OperandKind::Unused) => 0,
        Value::String(s) => {
            m.ctx.echo(&s)?;
            0
        }
        Value::Int(n) => n as i32,
        _ => 0,
    };
    Ok(Some(Signal::Exit(code)))
}

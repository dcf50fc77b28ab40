//! Object property access (`FetchObj*`) and §4.5.15's `Clone`/`UnsetObj`.

use crate::dispatch::Machine;
use crate::error::{OpResult, VmError};
use crate::instruction::Instruction;
use crate::value::Value;
use std::io::Write;

pub fn exec_fetch_obj<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let target = m.read(instr.op1, instr.op1_kind());
    let prop = m.read(instr.op2, instr.op2_kind());
    let prop_name = prop.to_string_lossy();
    let result = match target.deref() {
        Value::Object(obj) => obj.borrow().get(&prop_name).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    };
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

pub fn exec_unset_obj<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let target = m.read(instr.op1, instr.op1_kind());
    let prop = m.read(instr.op2, instr.op2_kind());
    if let Value::Object(obj) = target.deref() {
        obj.borrow_mut().unset(&prop.to_string_lossy());
    }
    Ok(None)
}

pub fn exec_clone<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let source = m.read(instr.op1, instr.op1_kind());
    let result = match source.deref() {
        Value::Object(obj) => Value::Object(std::rc::Rc::new(std::cell::RefCell::new(obj.borrow().deep_clone()))),
        _ => return Err(VmError::type_error("__clone method called on non-object")),
    };
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

//! §4.5.10 references, globals, and statics. `Op2` in `BindGlobal` names a
//! local slot directly (like a jump target) rather than going through the
//! operand-kind table — it addresses a binding, not a value.

use crate::dispatch::Machine;
use crate::error::{OpResult, VmError};
use crate::instruction::{Instruction, OperandKind};
use crate::value::{ArrayKey, PhpArray, Value};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

const SUPERGLOBALS: &[&str] = &[
    "_SERVER", "_GET", "_POST", "_SESSION", "_COOKIE", "_FILES", "_REQUEST", "_ENV",
];

pub fn exec_bind_global<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let name_value = m.read(instr.op1, instr.op1_kind());
    let Value::String(name) = name_value.deref() else {
        return Err(VmError::type_error("BIND_GLOBAL requires string variable name"));
    };
    let cell = match m.ctx.globals.get(&name) {
        Some(existing) => existing
            .as_reference_cell()
            .unwrap_or_else(|| Rc::new(RefCell::new(existing.clone()))),
        None => Rc::new(RefCell::new(Value::Null)),
    };
    m.ctx.globals.insert(name.clone(), Value::Reference(cell.clone()));
    m.set_slot_raw(instr.op2, OperandKind::Var, Value::Reference(cell));
    m.ctx.frame_mut().var_slot_names.insert(instr.op2, name);
    Ok(None)
}

pub fn exec_fetch_globals<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let mut out = PhpArray::new();
    for (name, value) in m.ctx.globals.iter() {
        out.set(ArrayKey::Str(name.clone()), value.clone());
    }
    for name in SUPERGLOBALS {
        if !out.contains_key(&ArrayKey::Str((*name).to_string())) {
            out.set(ArrayKey::Str((*name).to_string()), Value::new_array());
        }
    }
    let snapshot = Value::Array(out.clone());
    out.set(ArrayKey::Str("GLOBALS".to_string()), snapshot);
    m.write(instr.result, instr.result_kind(), Value::Array(out));
    Ok(None)
}

pub fn exec_fetch_static_prop_is<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let class = m.read(instr.op1, instr.op1_kind()).to_string_lossy();
    let prop = m.read(instr.op2, instr.op2_kind()).to_string_lossy();
    let result = m
        .registry
        .static_property(&class, &prop)
        .map(|v| !v.is_null())
        .unwrap_or(false);
    m.write(instr.result, instr.result_kind(), Value::Bool(result));
    Ok(None)
}

pub fn exec_fetch_static_prop_rw<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let class = m.read(instr.op1, instr.op1_kind()).to_string_lossy();
    let prop = m.read(instr.op2, instr.op2_kind()).to_string_lossy();
    let result = match m.registry.static_property(&class, &prop) {
        Some(v) => v,
        None => {
            m.registry.set_static_property(&class, &prop, Value::Null);
            Value::Null
        }
    };
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

pub fn exec_fetch_static_prop_unset<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let class = m.read(instr.op1, instr.op1_kind()).to_string_lossy();
    let prop = m.read(instr.op2, instr.op2_kind()).to_string_lossy();
    m.registry.unset_static_property(&class, &prop);
    Ok(None)
}

pub fn exec_declare_const<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let name_value = m.read(instr.op1, instr.op1_kind());
    let Value::String(name) = name_value.deref() else {
        return Err(VmError::type_error("DECLARE_CONST requires string constant name"));
    };
    let value = m.read(instr.op2, instr.op2_kind());
    m.ctx.global_constants.entry(name).or_insert(value);
    Ok(None)
}

pub fn exec_fetch_constant<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let name = m.read(instr.op1, instr.op1_kind()).to_string_lossy();
    let result = m
        .ctx
        .global_constants
        .get(&name)
        .cloned()
        .or_else(|| m.registry.global_constant(&name))
        .unwrap_or(Value::Null);
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

//! §4.5.2 assignment family. `Assign`'s `Op1` is unusual among operands: it
//! names a *write* destination, not a value to read — the source is `Op2`.

use crate::dispatch::Machine;
use crate::error::{OpResult, VmError};
use crate::instruction::{ArithOp, Instruction};
use crate::value::{ArrayKey, Value};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

pub fn exec_load_const<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    m.write(instr.result, instr.result_kind(), value);
    Ok(None)
}

pub fn exec_assign<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op2, instr.op2_kind());
    m.write(instr.op1, instr.op1_kind(), value.clone());
    m.write(instr.result, instr.result_kind(), value);
    Ok(None)
}

/// `Op1 =& Op2`: both slots end up sharing one `Reference` cell.
pub fn exec_assign_ref<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let current = m.read(instr.op2, instr.op2_kind());
    let cell = current.as_reference_cell().unwrap_or_else(|| Rc::new(RefCell::new(current)));
    m.set_slot_raw(instr.op2, instr.op2_kind(), Value::Reference(cell.clone()));
    m.set_slot_raw(instr.op1, instr.op1_kind(), Value::Reference(cell.clone()));
    m.write(instr.result, instr.result_kind(), Value::Reference(cell));
    Ok(None)
}

/// `Op1 ⊕= Op2`: compound arithmetic assignment, `Reserved` selecting the
/// operator. An unrecognized selector is `ValueError("UnknownOperation")`.
pub fn exec_assign_op<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let op = ArithOp::try_from(instr.reserved)
        .map_err(|_| VmError::value_error("UnknownOperation"))?;
    let lhs = m.read(instr.op1, instr.op1_kind());
    let rhs = m.read(instr.op2, instr.op2_kind());
    let opcode = arith_op_to_opcode(op);
    let result = super::arithmetic::apply_binary(m, opcode, &lhs, &rhs)?;
    m.write(instr.op1, instr.op1_kind(), result.clone());
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

fn arith_op_to_opcode(op: ArithOp) -> crate::instruction::Opcode {
    use crate::instruction::Opcode;
    match op {
        ArithOp::Add => Opcode::Add,
        ArithOp::Sub => Opcode::Sub,
        ArithOp::Mul => Opcode::Mul,
        ArithOp::Div => Opcode::Div,
        ArithOp::Mod => Opcode::Mod,
        ArithOp::Pow => Opcode::Pow,
        ArithOp::Concat => Opcode::Concat,
        ArithOp::BitAnd => Opcode::BitAnd,
        ArithOp::BitOr => Opcode::BitOr,
        ArithOp::BitXor => Opcode::BitXor,
        ArithOp::ShiftLeft => Opcode::ShiftLeft,
        ArithOp::ShiftRight => Opcode::ShiftRight,
    }
}

/// `Op1[Op2] := Temporaries[Reserved]`. A `Null` target auto-converts to an
/// empty `Array`; any other non-Array target is a `TypeError`, but (per
/// spec) the value is still written to `Result` for compiler compatibility.
pub fn exec_assign_dim<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read_temp_raw(instr.reserved);
    let container = m.read(instr.op1, instr.op1_kind());
    let has_key = !matches!(instr.op2_kind(), crate::instruction::OperandKind::Unused);
    let key = if has_key {
        Some(m.read(instr.op2, instr.op2_kind()))
    } else {
        None
    };

    let mut target = if container.is_null() { Value::new_array() } else { container };
    let outcome = match &mut target {
        Value::Array(arr) => {
            match &key {
                Some(k) => arr.set(ArrayKey::from_value(&k.deref()), value.clone()),
                None => {
                    arr.append(value.clone());
                }
            }
            Ok(())
        }
        other => Err(VmError::type_error(format!(
            "Cannot use a scalar value of type {} as an array",
            other.get_type()
        ))),
    };
    m.write(instr.op1, instr.op1_kind(), target);
    m.write(instr.result, instr.result_kind(), value);
    outcome.map(|()| None)
}

/// `Op1.propertyName := Temporaries[Reserved]`, `propertyName = ToString(Op2)`.
pub fn exec_assign_obj<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read_temp_raw(instr.reserved);
    let target = m.read(instr.op1, instr.op1_kind());
    let prop_value = m.read(instr.op2, instr.op2_kind());
    let prop_name = m.stringify(&prop_value)?;
    match target.deref() {
        Value::Object(obj) => {
            obj.borrow_mut().set(prop_name, value.clone());
            m.write(instr.result, instr.result_kind(), value);
            Ok(None)
        }
        _ => Err(VmError::type_error("attempt to assign property on non-object")),
    }
}

/// `Op1 ??= Op2`: assign only when `Op1` is currently null.
pub fn exec_qm_assign<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let current = m.read(instr.op1, instr.op1_kind());
    let result = if current.is_null() {
        let value = m.read(instr.op2, instr.op2_kind());
        m.write(instr.op1, instr.op1_kind(), value.clone());
        value
    } else {
        current
    };
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

fn step<W: Write>(m: &mut Machine<W>, instr: &Instruction, delta: i64, pre: bool) -> OpResult {
    let current = m.read(instr.op1, instr.op1_kind());
    let updated = match current.deref() {
        Value::Int(n) => Value::Int(n.wrapping_add(delta)),
        Value::Float(f) => Value::Float(f + delta as f64),
        Value::Null if delta > 0 => Value::Int(delta),
        other => Value::Int(other.to_int() + delta),
    };
    m.write(instr.op1, instr.op1_kind(), updated.clone());
    let result = if pre { updated } else { current };
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

pub fn exec_pre_inc<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    step(m, instr, 1, true)
}

pub fn exec_pre_dec<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    step(m, instr, -1, true)
}

pub fn exec_post_inc<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    step(m, instr, 1, false)
}

pub fn exec_post_dec<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    step(m, instr, -1, false)
}

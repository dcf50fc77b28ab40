//! Plain binary/unary/logical operators, supplementing §4.5.2's note that
//! "numeric arithmetic follows the language's coercion" with the concrete
//! per-opcode handlers a register machine dispatches directly (as opposed
//! to always going through `AssignOp`).

use crate::dispatch::Machine;
use crate::error::{OpResult, VmError};
use crate::instruction::{Instruction, Opcode};
use crate::value::Value;
use std::io::Write;

/// `Op1 ⊕ Op2` per spec §4.5.2: integer arithmetic promotes to float on
/// overflow, division is integer when exact else float, modulus takes the
/// dividend's sign, concatenation stringifies both sides.
pub fn apply_binary<W: Write>(m: &mut Machine<W>, op: Opcode, lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    use Opcode::*;
    if op == Concat {
        let l = m.stringify(lhs)?;
        let r = m.stringify(rhs)?;
        return Ok(Value::String(l + &r));
    }
    match op {
        BitAnd | BitOr | BitXor | ShiftLeft | ShiftRight => {
            let l = lhs.to_int();
            let r = rhs.to_int();
            return Ok(Value::Int(match op {
                BitAnd => l & r,
                BitOr => l | r,
                BitXor => l ^ r,
                ShiftLeft => l.wrapping_shl(r as u32),
                ShiftRight => l.wrapping_shr(r as u32),
                _ => unreachable!(),
            }));
        }
        _ => {}
    }

    let both_int = matches!(lhs.deref(), Value::Int(_)) && matches!(rhs.deref(), Value::Int(_));
    if both_int && matches!(op, Add | Sub | Mul) {
        let l = lhs.to_int();
        let r = rhs.to_int();
        let result = match op {
            Add => l.checked_add(r),
            Sub => l.checked_sub(r),
            Mul => l.checked_mul(r),
            _ => unreachable!(),
        };
        if let Some(v) = result {
            return Ok(Value::Int(v));
        }
        let lf = l as f64;
        let rf = r as f64;
        return Ok(Value::Float(match op {
            Add => lf + rf,
            Sub => lf - rf,
            Mul => lf * rf,
            _ => unreachable!(),
        }));
    }

    match op {
        Div => {
            let (l, r) = (lhs.to_float(), rhs.to_float());
            if r == 0.0 {
                return Err(VmError::value_error("division by zero"));
            }
            if both_int {
                let (li, ri) = (lhs.to_int(), rhs.to_int());
                if ri != 0 && li % ri == 0 {
                    return Ok(Value::Int(li / ri));
                }
            }
            Ok(Value::Float(l / r))
        }
        Mod => {
            let r = rhs.to_int();
            if r == 0 {
                return Err(VmError::value_error("modulo by zero"));
            }
            Ok(Value::Int(lhs.to_int() % r))
        }
        Pow => {
            if both_int {
                let (l, r) = (lhs.to_int(), rhs.to_int());
                if r >= 0 {
                    if let Some(v) = checked_ipow(l, r as u32) {
                        return Ok(Value::Int(v));
                    }
                }
            }
            Ok(Value::Float(lhs.to_float().powf(rhs.to_float())))
        }
        Add => Ok(Value::Float(lhs.to_float() + rhs.to_float())),
        Sub => Ok(Value::Float(lhs.to_float() - rhs.to_float())),
        Mul => Ok(Value::Float(lhs.to_float() * rhs.to_float())),
        _ => Err(VmError::fatal(format!("{op:?} is not a binary arithmetic opcode"))),
    }
}

fn checked_ipow(mut base: i64, mut exp: u32) -> Option<i64> {
    let mut result: i64 = 1;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.checked_mul(base)?;
        }
        exp >>= 1;
        if exp > 0 {
            base = base.checked_mul(base)?;
        }
    }
    Some(result)
}

pub fn exec_binary<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let lhs = m.read(instr.op1, instr.op1_kind());
    let rhs = m.read(instr.op2, instr.op2_kind());
    let result = apply_binary(m, instr.opcode, &lhs, &rhs)?;
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

pub fn exec_unary<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let operand = m.read(instr.op1, instr.op1_kind());
    let result = match instr.opcode {
        Opcode::BitNot => Value::Int(!operand.to_int()),
        Opcode::BoolNot => Value::Bool(!operand.to_bool()),
        Opcode::Neg => match operand.deref() {
            Value::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .unwrap_or_else(|| Value::Float(-(n as f64))),
            _ => Value::Float(-operand.to_float()),
        },
        other => return Err(VmError::fatal(format!("{other:?} is not a unary opcode"))),
    };
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

pub fn exec_logical<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let lhs = m.read(instr.op1, instr.op1_kind()).to_bool();
    let rhs = m.read(instr.op2, instr.op2_kind()).to_bool();
    let result = match instr.opcode {
        Opcode::BoolAnd => lhs && rhs,
        Opcode::BoolOr => lhs || rhs,
        Opcode::BoolXor => lhs != rhs,
        other => return Err(VmError::fatal(format!("{other:?} is not a logical opcode"))),
    };
    m.write(instr.result, instr.result_kind(), Value::Bool(result));
    Ok(None)
}

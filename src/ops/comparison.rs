//! Equality and ordering opcodes. Equality delegates straight to
//! `Value::loose_equals`/`strict_equals` (§4.1); ordering implements the
//! same numeric-string-aware comparison spirit for `<`/`<=`/`<=>`.

use crate::dispatch::Machine;
use crate::error::OpResult;
use crate::instruction::{Instruction, Opcode};
use crate::value::Value;
use std::cmp::Ordering;
use std::io::Write;

fn compare(lhs: &Value, rhs: &Value) -> Ordering {
    match (lhs.deref(), rhs.deref()) {
        (Value::String(a), Value::String(b)) => {
            let (na, nb) = (a.parse::<f64>(), b.parse::<f64>());
            match (na, nb) {
                (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => a.cmp(&b),
            }
        }
        (Value::Array(a), Value::Array(b)) => a.len().cmp(&b.len()),
        _ => lhs.to_float().partial_cmp(&rhs.to_float()).unwrap_or(Ordering::Equal),
    }
}

pub fn exec_compare<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let lhs = m.read(instr.op1, instr.op1_kind());
    let rhs = m.read(instr.op2, instr.op2_kind());
    let result = match instr.opcode {
        Opcode::IsEqual => lhs.loose_equals(&rhs),
        Opcode::IsNotEqual => !lhs.loose_equals(&rhs),
        Opcode::IsIdentical => lhs.strict_equals(&rhs),
        Opcode::IsNotIdentical => !lhs.strict_equals(&rhs),
        Opcode::IsSmaller => compare(&lhs, &rhs) == Ordering::Less,
        Opcode::IsSmallerOrEqual => compare(&lhs, &rhs) != Ordering::Greater,
        Opcode::Spaceship => {
            let value = match compare(&lhs, &rhs) {
                Ordering::Less => -1,
                Ordering::Equal => 0,
                Ordering::Greater => 1,
            };
            m.write(instr.result, instr.result_kind(), Value::Int(value));
            return Ok(None);
        }
        other => unreachable!("{other:?} is not a comparison opcode"),
    };
    m.write(instr.result, instr.result_kind(), Value::Bool(result));
    Ok(None)
}

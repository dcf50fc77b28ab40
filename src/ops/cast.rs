//! §4.5.3 casts and type tests.

use crate::dispatch::Machine;
use crate::error::{OpResult, VmError};
use crate::instruction::{CastTag, Instruction};
use crate::value::{ArrayKey, PhpArray, Value};
use std::io::Write;

pub fn exec_cast<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let tag = CastTag::try_from(instr.reserved).map_err(|_| VmError::value_error("unknown cast tag"))?;
    let value = m.read(instr.op1, instr.op1_kind());
    let result = match tag {
        CastTag::Bool => Value::Bool(value.to_bool()),
        CastTag::Int => Value::Int(value.to_int()),
        CastTag::Float => Value::Float(value.to_float()),
        CastTag::String => Value::String(m.stringify(&value)?),
        CastTag::Array => match value.deref() {
            Value::Array(_) => value,
            Value::Null => Value::new_array(),
            scalar => {
                let mut arr = PhpArray::new();
                arr.set(ArrayKey::Int(0), scalar);
                Value::Array(arr)
            }
        },
        CastTag::Object => match value.deref() {
            Value::Object(_) => value,
            Value::Array(arr) => {
                let obj = Value::new_object("stdClass");
                if let Value::Object(handle) = &obj {
                    for (k, v) in arr.iter() {
                        handle.borrow_mut().set(k.to_string(), v.clone());
                    }
                }
                obj
            }
            scalar => {
                let obj = Value::new_object("stdClass");
                if let Value::Object(handle) = &obj {
                    handle.borrow_mut().set("scalar", scalar);
                }
                obj
            }
        },
    };
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

/// Names accepted by `IsType`/`VerifyArgType`/`VerifyReturnType` per §4.5.3.
pub fn type_name_matches(value: &Value, type_name: &str) -> bool {
    let name = type_name.to_ascii_lowercase();
    if name == "mixed" || name.is_empty() {
        return true;
    }
    match name.as_str() {
        "int" | "integer" => matches!(value.deref(), Value::Int(_)),
        "float" | "double" | "real" => matches!(value.deref(), Value::Float(_)),
        "bool" | "boolean" => matches!(value.deref(), Value::Bool(_)),
        "string" => matches!(value.deref(), Value::String(_)),
        "null" => value.is_null(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "callable" => matches!(value.deref(), Value::Callable(_)) || value.is_object(),
        _ => false,
    }
}

pub fn exec_is_type<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    let type_name = m.read(instr.op2, instr.op2_kind()).to_string_lossy();
    let result = type_name_matches(&value, &type_name);
    m.write(instr.result, instr.result_kind(), Value::Bool(result));
    Ok(None)
}

pub fn exec_verify_arg_type<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    let type_name = m.read(instr.op2, instr.op2_kind()).to_string_lossy();
    if !type_name_matches(&value, &type_name) {
        return Err(VmError::type_error(format!(
            "argument must be of type {type_name}, {} given",
            value.get_type()
        )));
    }
    Ok(None)
}

pub fn exec_verify_return_type<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    let type_name = m.read(instr.op2, instr.op2_kind()).to_string_lossy();
    if !type_name_matches(&value, &type_name) {
        return Err(VmError::type_error(format!(
            "return value must be of type {type_name}, {} given",
            value.get_type()
        )));
    }
    Ok(None)
}

pub fn exec_verify_abstract_class<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let class_name = m.read(instr.op1, instr.op1_kind()).to_string_lossy();
    let is_abstract_by_name = class_name.starts_with("Abstract") || class_name.ends_with("Abstract");
    let is_abstract_by_descriptor = m.registry.class(&class_name).map(|d| d.is_abstract).unwrap_or(false);
    if is_abstract_by_name || is_abstract_by_descriptor {
        return Err(VmError::AbstractInstantiation(class_name));
    }
    Ok(None)
}

pub fn exec_instance_of<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    let target_class = m.read(instr.op2, instr.op2_kind()).to_string_lossy();
    let result = match value.deref() {
        Value::Object(obj) => {
            let class_name = obj.borrow().class_name.clone();
            m.registry.instance_of(&class_name, &target_class)
        }
        _ => false,
    };
    m.write(instr.result, instr.result_kind(), Value::Bool(result));
    Ok(None)
}

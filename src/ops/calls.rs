//! §4.5.6/§4.5.7: parameter receive/send and function/method/constructor
//! calls. `InitMethodCall` supplements the distilled family with an
//! explicit method-dispatch entry point (`$obj->method(...)`), since the
//! spec's `InitFCall` family only names free-function and constructor
//! resolution.

use crate::context::CallContext;
use crate::dispatch::Machine;
use crate::error::{OpResult, VmError};
use crate::instruction::{Instruction, OperandKind};
use crate::value::{CallableValue, PhpArray, Value};
use std::io::Write;

pub fn exec_init_fcall<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let callee = m.read(instr.op1, instr.op1_kind());
    let num_args = m.read(instr.op2, instr.op2_kind());
    if !matches!(num_args.deref(), Value::Int(_)) && !matches!(instr.op2_kind(), OperandKind::Unused) {
        return Err(VmError::type_error("number of arguments must be an integer"));
    }
    let mut ctxc = CallContext::default();
    match callee.deref() {
        Value::String(_) | Value::Callable(_) => ctxc.callee = Some(callee),
        Value::Object(ref obj) if m.registry.method(&obj.borrow().class_name, "__invoke").is_some() => {
            ctxc.method_name = Some("__invoke".to_string());
            ctxc.target_object = Some(callee);
        }
        _ => return Err(VmError::type_error("function name must be a string or callable object")),
    }
    m.ctx.call_context_stack.push(ctxc);
    Ok(None)
}

pub fn exec_init_fcall_by_name<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let callee = m.read(instr.op1, instr.op1_kind());
    let Value::String(_) = callee.deref() else {
        return Err(VmError::type_error("INIT_FCALL_BY_NAME requires string function name"));
    };
    let mut ctxc = CallContext::default();
    ctxc.callee = Some(callee);
    m.ctx.call_context_stack.push(ctxc);
    Ok(None)
}

pub fn exec_init_method_call<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let target = m.read(instr.op1, instr.op1_kind());
    let method = m.read(instr.op2, instr.op2_kind()).to_string_lossy();
    let mut ctxc = CallContext::default();
    ctxc.target_object = Some(target);
    ctxc.method_name = Some(method);
    m.ctx.call_context_stack.push(ctxc);
    Ok(None)
}

pub fn exec_init_ctor_call<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let class_or_object = m.read(instr.op1, instr.op1_kind());
    let (class_name, instance) = match class_or_object.deref() {
        Value::Object(obj) => (obj.borrow().class_name.clone(), class_or_object.clone()),
        other => {
            let class_name = other.to_string_lossy();
            (class_name.clone(), Value::new_object(class_name))
        }
    };
    let mut ctxc = CallContext::default();
    ctxc.callee = Some(Value::String(format!("{class_name}::__construct")));
    ctxc.target_object = Some(instance);
    ctxc.is_ctor = true;
    m.ctx.call_context_stack.push(ctxc);
    Ok(None)
}

fn send<W: Write>(m: &mut Machine<W>, instr: &Instruction, deep_copy: bool) -> OpResult {
    let mut value = m.read(instr.op1, instr.op1_kind());
    if deep_copy {
        value = value.deep_clone();
    }
    if let Some(ctxc) = m.ctx.call_context_stack.last_mut() {
        ctxc.args.push(value.clone());
    }
    m.write(instr.result, instr.result_kind(), value);
    Ok(None)
}

pub fn exec_send<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    send(m, instr, false)
}

pub fn exec_send_no_ref<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    send(m, instr, true)
}

pub fn exec_send_unpack<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let value = m.read(instr.op1, instr.op1_kind());
    let items: Vec<Value> = match value.deref() {
        Value::Array(arr) => arr.values().cloned().collect(),
        other => vec![other],
    };
    if let Some(ctxc) = m.ctx.call_context_stack.last_mut() {
        ctxc.args.extend(items);
    }
    Ok(None)
}

/// Resolve and invoke whatever `InitFCall`/`InitMethodCall`/`InitCtorCall`
/// assembled, writing the call's result to `Result`.
pub fn exec_do_fcall<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let ctxc = m
        .ctx
        .call_context_stack
        .pop()
        .ok_or_else(|| VmError::fatal("DO_FCALL with no matching Init*Call"))?;
    let CallContext {
        callee,
        method_name,
        target_object,
        args,
        is_ctor,
    } = ctxc;

    let result = if is_ctor {
        let instance = target_object.expect("InitCtorCall always sets target_object");
        let class_name = match instance.deref() {
            Value::Object(obj) => obj.borrow().class_name.clone(),
            _ => unreachable!("InitCtorCall always produces an Object instance"),
        };
        match m.registry.method(&class_name, "__construct") {
            Some(ctor) => {
                m.call_function(ctor, args, Some(instance.clone()), Some(class_name))?;
            }
            None => {
                // No declared constructor: positional args land on prop0, prop1, ...
                if let Value::Object(obj) = instance.deref() {
                    for (i, arg) in args.into_iter().enumerate() {
                        obj.borrow_mut().set(format!("prop{i}"), arg);
                    }
                }
            }
        }
        if let Value::Object(obj) = instance.deref() {
            obj.borrow_mut().constructed = true;
        }
        instance
    } else if let Some(target) = target_object {
        let method_name = method_name.ok_or_else(|| VmError::fatal("method call with no method name"))?;
        let class_name = match target.deref() {
            Value::Object(obj) => obj.borrow().class_name.clone(),
            _ => return Err(VmError::type_error("method call on a non-object")),
        };
        let method = m
            .registry
            .method(&class_name, &method_name)
            .ok_or_else(|| VmError::lookup(format!("call to undefined method {class_name}::{method_name}()")))?;
        m.call_function(method, args, Some(target), Some(class_name))?
    } else {
        match callee.ok_or_else(|| VmError::fatal("DO_FCALL with no callee"))?.deref() {
            Value::String(name) => match m.registry.function(&name) {
                Some(function) => m.call_function(function, args, None, None)?,
                None if m.bridge.has_builtin(&name) => m.bridge.call_builtin(&name, &args)?,
                None => return Err(VmError::lookup(format!("call to undefined function {name}()"))),
            },
            Value::Callable(CallableValue::Named(name)) => match m.registry.function(&name) {
                Some(function) => m.call_function(function, args, None, None)?,
                None if m.bridge.has_builtin(&name) => m.bridge.call_builtin(&name, &args)?,
                None => return Err(VmError::lookup(format!("call to undefined function {name}()"))),
            },
            Value::Callable(CallableValue::Closure(closure)) => {
                m.call_function(closure.function.clone(), args, closure.bound_this.clone(), None)?
            }
            other => return Err(VmError::type_error(format!("value of type {} is not callable", other.get_type()))),
        }
    };
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

/// Per spec §4.5.7, a shorthand for `InitCtorCall` + `DoFCall` against an
/// already-constructed object — used when the compiler has already
/// allocated the instance and just needs the constructor run.
pub fn exec_call_ctor<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    exec_do_fcall(m, instr)
}

pub fn exec_recv<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let idx = instr.op1 as usize;
    let value = m.ctx.frame().locals.get(idx).cloned().unwrap_or(Value::Null);
    m.write(instr.result, instr.result_kind(), value);
    Ok(None)
}

pub fn exec_recv_init<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let idx = instr.op1 as usize;
    let provided = m.ctx.frame().locals.get(idx).cloned().unwrap_or(Value::Null);
    let result = if provided.is_null() {
        m.read(instr.op2, instr.op2_kind())
    } else {
        provided
    };
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

pub fn exec_recv_variadic<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    let idx = instr.op1 as usize;
    let result = match m.ctx.frame().locals.get(idx) {
        Some(Value::Array(arr)) => Value::Array(arr.clone()),
        _ => Value::Array(PhpArray::new()),
    };
    m.write(instr.result, instr.result_kind(), result);
    Ok(None)
}

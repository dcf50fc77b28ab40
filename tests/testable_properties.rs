//! Universally-quantified invariants this core is expected to hold, each
//! checked with a concrete instance rather than restated as prose.

mod common;

use common::{function, Harness};
use vhp_core::context::CallFrame;
use vhp_core::instruction::{encode_op_types, encode_result_type, Instruction, OperandKind, Opcode};
use vhp_core::value::{ObjectInstance, PhpArray, Value};

fn instr(opcode: Opcode, op1: u32, op2: u32, result: u32, op1_kind: OperandKind, op2_kind: OperandKind, result_kind: OperandKind, reserved: u8) -> Instruction {
    Instruction {
        opcode,
        op1,
        op2,
        result,
        op_type1: encode_op_types(op1_kind, op2_kind),
        op_type2: encode_result_type(result_kind),
        reserved,
    }
}

#[test]
fn ip_advances_by_exactly_one_for_a_non_control_flow_opcode() {
    // Three Nops in a row: each is non-control-flow, so the dispatch loop
    // (not the handler) must be the thing advancing `ip`, one slot at a
    // time, never skipping or repeating.
    let f = function(
        vec![
            instr(Opcode::Nop, 0, 0, 0, OperandKind::Unused, OperandKind::Unused, OperandKind::Unused, 0),
            instr(Opcode::Add, 0, 1, 2, OperandKind::TmpVar, OperandKind::TmpVar, OperandKind::TmpVar, 0),
            instr(Opcode::Nop, 0, 0, 0, OperandKind::Unused, OperandKind::Unused, OperandKind::Unused, 0),
        ],
        vec![],
        0,
        3,
    );
    let mut h = Harness::new();
    h.ctx.call_stack.push(CallFrame::new(f, None, None));
    h.ctx.frame_mut().temporaries[0] = Value::Int(1);
    h.ctx.frame_mut().temporaries[1] = Value::Int(2);
    let mut m = h.machine();
    m.run().unwrap();
    // Three non-control-flow instructions, none of which touch `ip`
    // themselves: the final `ip` must be exactly 3, one past the last slot.
    assert_eq!(m.ctx.frame().ip, 3);
    assert_eq!(m.read(2, OperandKind::TmpVar), Value::Int(3));
}

#[test]
fn reference_aliasing_is_observed_through_either_slot() {
    let f = function(
        vec![instr(Opcode::BindGlobal, 0, 5, 0, OperandKind::Const, OperandKind::Unused, OperandKind::Unused, 0)],
        vec![Value::String("x".into())],
        6,
        0,
    );
    let mut h = Harness::new();
    h.ctx.call_stack.push(CallFrame::new(f, None, None));
    let mut m = h.machine();
    m.run().unwrap();

    m.write(5, OperandKind::Var, Value::Int(1));
    assert_eq!(m.ctx.globals.get("x").unwrap().deref(), Value::Int(1));

    let cell = m.ctx.globals.get("x").unwrap().as_reference_cell().unwrap();
    *cell.borrow_mut() = Value::Int(2);
    assert_eq!(m.read(5, OperandKind::Var), Value::Int(2));
}

#[test]
fn silence_is_true_iff_the_stack_is_non_empty() {
    let mut ctx = vhp_core::ExecutionContext::new(Vec::new());
    assert!(!ctx.is_silenced());
    ctx.begin_silence();
    assert!(ctx.is_silenced());
    ctx.begin_silence();
    assert!(ctx.is_silenced());
    ctx.end_silence();
    assert!(ctx.is_silenced());
    ctx.end_silence();
    assert!(!ctx.is_silenced());
    // A stray EndSilence with nothing to pop is a no-op, not a panic.
    ctx.end_silence();
    assert!(!ctx.is_silenced());
}

#[test]
fn foreach_free_removes_the_iterator_and_both_companion_temporaries() {
    let mut arr = PhpArray::new();
    arr.append(Value::Int(1));
    let f = function(
        vec![
            instr(Opcode::ForeachReset, 0, 3, 0, OperandKind::Const, OperandKind::Unused, OperandKind::Unused, 0),
            instr(Opcode::ForeachFree, 3, 0, 0, OperandKind::Unused, OperandKind::Unused, OperandKind::Unused, 0),
        ],
        vec![Value::Array(arr)],
        0,
        5,
    );
    let mut h = Harness::new();
    h.ctx.call_stack.push(CallFrame::new(f, None, None));
    h.ctx.frame_mut().temporaries[3] = Value::Int(111);
    h.ctx.frame_mut().temporaries[4] = Value::Int(222);
    let mut m = h.machine();
    m.run().unwrap();
    assert!(!m.ctx.foreach_iterators.contains_key(&3));
    assert_eq!(m.ctx.frame().temporaries[3], Value::Null);
    assert_eq!(m.ctx.frame().temporaries[4], Value::Null);
}

#[test]
fn coalesce_prefers_the_left_operand_unless_it_is_null() {
    let f = function(
        vec![
            instr(Opcode::Coalesce, 0, 1, 2, OperandKind::TmpVar, OperandKind::TmpVar, OperandKind::TmpVar, 0),
            instr(Opcode::Coalesce, 3, 1, 4, OperandKind::TmpVar, OperandKind::TmpVar, OperandKind::TmpVar, 0),
        ],
        vec![],
        0,
        5,
    );
    let mut h = Harness::new();
    h.ctx.call_stack.push(CallFrame::new(f, None, None));
    h.ctx.frame_mut().temporaries[0] = Value::Int(42);
    h.ctx.frame_mut().temporaries[1] = Value::Int(7);
    h.ctx.frame_mut().temporaries[3] = Value::Null;
    let mut m = h.machine();
    m.run().unwrap();
    assert_eq!(m.read(2, OperandKind::TmpVar), Value::Int(42));
    assert_eq!(m.read(4, OperandKind::TmpVar), Value::Int(7));
}

#[test]
fn clone_produces_an_object_with_no_shared_nested_array_identity() {
    let mut h = Harness::new();
    let mut inner = PhpArray::new();
    inner.append(Value::Int(1));
    let mut source = ObjectInstance::new("Point");
    source.set("tags", Value::Array(inner));
    let handle = std::rc::Rc::new(std::cell::RefCell::new(source));

    let f = function(
        vec![instr(Opcode::Clone, 0, 0, 1, OperandKind::TmpVar, OperandKind::Unused, OperandKind::TmpVar, 0)],
        vec![],
        0,
        2,
    );
    h.ctx.call_stack.push(CallFrame::new(f, None, None));
    h.ctx.frame_mut().temporaries[0] = Value::Object(handle.clone());
    let mut m = h.machine();
    m.run().unwrap();

    let Value::Object(cloned) = m.read(1, OperandKind::TmpVar) else {
        panic!("Clone must produce an Object");
    };
    assert_ne!(handle.borrow().id, cloned.borrow().id);
    let (Some(Value::Array(src_tags)), Some(Value::Array(cloned_tags))) =
        (handle.borrow().get("tags").cloned(), cloned.borrow().get("tags").cloned())
    else {
        panic!("expected both objects to carry a tags array");
    };
    assert_eq!(src_tags.len(), cloned_tags.len());
    // Structural equality holds, but mutating one must not affect the other.
    let mut cloned_tags = cloned_tags;
    cloned_tags.append(Value::Int(99));
    assert_eq!(src_tags.len(), 1);
}

#[test]
fn suppressible_errors_halt_the_run_unless_silenced() {
    // AssignDim on a scalar, non-null container is a TypeError (§4.5.2):
    // fatal to an unsilenced run, but swallowed — Result defaulting to
    // Null — once BeginSilence is in effect.
    let f = |begin_silence: bool| {
        let mut instrs = vec![];
        if begin_silence {
            instrs.push(instr(Opcode::BeginSilence, 0, 0, 0, OperandKind::Unused, OperandKind::Unused, OperandKind::Unused, 0));
        }
        instrs.push(instr(Opcode::AssignDim, 0, 0, 2, OperandKind::TmpVar, OperandKind::Unused, OperandKind::TmpVar, 1));
        function(instrs, vec![], 0, 3)
    };

    let mut h = Harness::new();
    h.ctx.call_stack.push(CallFrame::new(f(false), None, None));
    h.ctx.frame_mut().temporaries[0] = Value::Int(5);
    h.ctx.frame_mut().temporaries[1] = Value::Int(9);
    let mut m = h.machine();
    assert!(m.run().is_err());

    let mut h = Harness::new();
    h.ctx.call_stack.push(CallFrame::new(f(true), None, None));
    h.ctx.frame_mut().temporaries[0] = Value::Int(5);
    h.ctx.frame_mut().temporaries[1] = Value::Int(9);
    let mut m = h.machine();
    m.run().unwrap();
    assert_eq!(m.read(2, OperandKind::TmpVar), Value::Null);
}

#[test]
fn switch_with_a_default_entry_always_redirects_the_ip() {
    let mut table = PhpArray::new();
    table.set(vhp_core::value::ArrayKey::Int(-1), Value::Int(77));
    let f = function(
        vec![instr(Opcode::SwitchLong, 0, 1, 0, OperandKind::TmpVar, OperandKind::Const, OperandKind::Unused, 0)],
        vec![Value::Array(table)],
        0,
        1,
    );
    let mut h = Harness::new();
    h.ctx.call_stack.push(CallFrame::new(f, None, None));
    h.ctx.frame_mut().temporaries[0] = Value::Int(12345); // matches nothing but the default
    let ip_before = h.ctx.frame().ip;
    let mut m = h.machine();
    m.run().unwrap();
    assert_ne!(m.ctx.frame().ip, ip_before);
    assert_eq!(m.ctx.frame().ip, 77);
}

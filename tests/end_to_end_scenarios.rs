//! The seven concrete end-to-end scenarios this core's opcode handlers are
//! expected to satisfy, each driven through the public `Machine` API rather
//! than by calling a handler function directly.

mod common;

use common::{function, generator_function, Harness};
use vhp_core::instruction::{encode_op_types, encode_result_type, ArithOp, Instruction, OperandKind, Opcode};
use vhp_core::Value;

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
fn scenario_1_arithmetic_assignment() {
    let f = function(
        vec![instr(
            Opcode::AssignOp,
            0,
            1,
            2,
            OperandKind::TmpVar,
            OperandKind::TmpVar,
            OperandKind::TmpVar,
            ArithOp::Add as u8,
        )],
        vec![],
        0,
        3,
    );
    let mut h = Harness::new();
    h.ctx.call_stack.push(vhp_core::context::CallFrame::new(f, None, None));
    h.ctx.frame_mut().temporaries[0] = Value::Int(10);
    h.ctx.frame_mut().temporaries[1] = Value::Int(5);
    let mut m = h.machine();
    let result = m.run().unwrap();
    assert_eq!(result, Value::Null);
    assert_eq!(m.read(2, OperandKind::TmpVar), Value::Int(15));
}

#[test]
fn scenario_2_case_loose_vs_strict() {
    let f = function(
        vec![
            instr(Opcode::Case, 0, 1, 2, OperandKind::TmpVar, OperandKind::TmpVar, OperandKind::TmpVar, 0),
            instr(Opcode::CaseStrict, 0, 1, 3, OperandKind::TmpVar, OperandKind::TmpVar, OperandKind::TmpVar, 0),
        ],
        vec![],
        0,
        4,
    );
    let mut h = Harness::new();
    h.ctx.call_stack.push(vhp_core::context::CallFrame::new(f, None, None));
    h.ctx.frame_mut().temporaries[0] = Value::String("2".into());
    h.ctx.frame_mut().temporaries[1] = Value::Int(2);
    let mut m = h.machine();
    m.run().unwrap();
    assert_eq!(m.read(2, OperandKind::TmpVar), Value::Bool(true));
    assert_eq!(m.read(3, OperandKind::TmpVar), Value::Bool(false));
}

#[test]
fn scenario_3_foreach_free_of_a_slot_that_was_never_reset() {
    let f = function(
        vec![instr(Opcode::ForeachFree, 10, 0, 0, OperandKind::Unused, OperandKind::Unused, OperandKind::Unused, 0)],
        vec![],
        0,
        0,
    );
    let mut h = Harness::new();
    h.ctx.call_stack.push(vhp_core::context::CallFrame::new(f, None, None));
    let mut m = h.machine();
    let result = m.run();
    assert!(result.is_ok());
    assert!(!m.ctx.foreach_iterators.contains_key(&10));
}

#[test]
fn scenario_4_rope_build() {
    let f = function(
        vec![
            instr(Opcode::RopeInit, 0, 0, 10, OperandKind::TmpVar, OperandKind::Unused, OperandKind::Unused, 0),
            instr(Opcode::RopeAdd, 10, 1, 0, OperandKind::Unused, OperandKind::TmpVar, OperandKind::Unused, 0),
            instr(Opcode::RopeAdd, 10, 2, 0, OperandKind::Unused, OperandKind::TmpVar, OperandKind::Unused, 0),
            instr(Opcode::RopeAdd, 10, 3, 0, OperandKind::Unused, OperandKind::TmpVar, OperandKind::Unused, 0),
            instr(Opcode::RopeEnd, 10, 0, 5, OperandKind::Unused, OperandKind::Unused, OperandKind::TmpVar, 0),
        ],
        vec![],
        0,
        6,
    );
    let mut h = Harness::new();
    h.ctx.call_stack.push(vhp_core::context::CallFrame::new(f, None, None));
    h.ctx.frame_mut().temporaries[0] = Value::String("Hello".into());
    h.ctx.frame_mut().temporaries[1] = Value::String(" ".into());
    h.ctx.frame_mut().temporaries[2] = Value::String("World".into());
    h.ctx.frame_mut().temporaries[3] = Value::String("!".into());
    let mut m = h.machine();
    m.run().unwrap();
    assert_eq!(m.read(5, OperandKind::TmpVar), Value::String("Hello World!".to_string()));
    assert!(m.ctx.rope_buffers.get(&10).is_none());
}

#[test]
fn scenario_5_bind_global_aliasing() {
    let f = function(
        vec![instr(Opcode::BindGlobal, 0, 5, 0, OperandKind::Const, OperandKind::Unused, OperandKind::Unused, 0)],
        vec![Value::String("test_var".into())],
        6,
        0,
    );
    let mut h = Harness::new();
    h.ctx.call_stack.push(vhp_core::context::CallFrame::new(f, None, None));
    h.ctx.globals.insert("test_var".to_string(), Value::String("global_value".into()));
    let mut m = h.machine();
    m.run().unwrap();

    m.write(5, OperandKind::Var, Value::Int(7));
    assert_eq!(m.read(5, OperandKind::Var), Value::Int(7));
    assert_eq!(m.ctx.globals.get("test_var").unwrap().deref(), Value::Int(7));

    m.ctx.globals.get("test_var").unwrap().as_reference_cell().unwrap().replace(Value::Int(9));
    assert_eq!(m.read(5, OperandKind::Var), Value::Int(9));
}

#[test]
fn scenario_6_include_once_idempotence_and_missing_require_is_fatal() {
    let f = function(
        vec![
            instr(Opcode::IncludeOnce, 0, 0, 1, OperandKind::Const, OperandKind::Unused, OperandKind::TmpVar, 0),
            instr(Opcode::IncludeOnce, 0, 0, 2, OperandKind::Const, OperandKind::Unused, OperandKind::TmpVar, 0),
        ],
        vec![Value::String("lib.php".into())],
        0,
        3,
    );
    let mut h = Harness::new();
    h.ctx.call_stack.push(vhp_core::context::CallFrame::new(f, None, None));
    let contents = "x".repeat(100);
    let fake = common::FakeIncludes::with("lib.php", contents);
    let mut m = vhp_core::Machine {
        ctx: &mut h.ctx,
        registry: &mut h.registry,
        bridge: &mut h.bridge,
        includes: &fake,
        config: &h.config,
        #[cfg(feature = "debug-hooks")]
        observer: None,
    };
    m.run().unwrap();
    assert_eq!(m.read(1, OperandKind::TmpVar), Value::Int(100));
    assert_eq!(m.read(2, OperandKind::TmpVar), Value::Bool(true));

    let require_missing = function(
        vec![instr(Opcode::Require, 0, 0, 0, OperandKind::Const, OperandKind::Unused, OperandKind::TmpVar, 0)],
        vec![Value::String("missing.php".into())],
        0,
        1,
    );
    let mut h2 = Harness::new();
    h2.ctx.call_stack.push(vhp_core::context::CallFrame::new(require_missing, None, None));
    let mut m2 = h2.machine();
    let err = m2.run().unwrap_err();
    assert!(err.to_string().contains("require("));
}

#[test]
fn scenario_7_generator_yield_suspends_with_value_and_key() {
    let f = generator_function(
        vec![instr(Opcode::Yield, 0, 1, 3, OperandKind::Const, OperandKind::Const, OperandKind::TmpVar, 0)],
        vec![Value::String("v".into()), Value::Int(1)],
        0,
        4,
    );
    let mut h = Harness::new();
    let mut reg = common::NullRegistry::default();
    let mut bridge = common::NullBridge::default();
    let includes = common::NullIncludes::default();
    let mut m = vhp_core::Machine {
        ctx: &mut h.ctx,
        registry: &mut reg,
        bridge: &mut bridge,
        includes: &includes,
        config: &h.config,
        #[cfg(feature = "debug-hooks")]
        observer: None,
    };
    let handle = m.call_function(f, vec![], None, None).unwrap();
    assert!(matches!(handle, Value::Object(_)));
    let gen = m.ctx.current_generator.as_ref().expect("generator should be active");
    assert!(gen.suspended);
    assert_eq!(gen.yielded_value, Value::String("v".into()));
    assert_eq!(gen.yielded_key, Value::Int(1));
    assert!(gen.pending_result_slot.is_some());
}

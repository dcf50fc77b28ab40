//! Opcode handlers (component C5), one module per family per §4.5.
//!
//! `dispatch_instruction` is the single point the dispatch loop calls
//! through; it exists so `Machine::run` doesn't itself need a 100-arm match.

mod arithmetic;
mod array_ops;
mod assign;
mod calls;
mod cast;
mod comparison;
mod control_flow;
mod generator;
mod globals;
mod include;
mod isset;
mod iteration;
mod object_ops;
mod output;
mod rope;
mod silence;
mod strings;

use crate::dispatch::Machine;
use crate::error::VmError;
use crate::instruction::{Instruction, Opcode};
use std::io::Write;

pub type OpResult = crate::error::OpResult;

pub fn dispatch_instruction<W: Write>(m: &mut Machine<W>, instr: &Instruction) -> OpResult {
    use Opcode::*;
    match instr.opcode {
        LoadConst => assign::exec_load_const(m, instr),
        Assign => assign::exec_assign(m, instr),
        AssignRef => assign::exec_assign_ref(m, instr),
        AssignOp => assign::exec_assign_op(m, instr),
        AssignDim => assign::exec_assign_dim(m, instr),
        AssignObj => assign::exec_assign_obj(m, instr),
        QmAssign => assign::exec_qm_assign(m, instr),
        PreInc => assign::exec_pre_inc(m, instr),
        PreDec => assign::exec_pre_dec(m, instr),
        PostInc => assign::exec_post_inc(m, instr),
        PostDec => assign::exec_post_dec(m, instr),

        Add | Sub | Mul | Div | Mod | Pow | Concat | BitAnd | BitOr | BitXor | ShiftLeft | ShiftRight => {
            arithmetic::exec_binary(m, instr)
        }
        BitNot | Neg | BoolNot => arithmetic::exec_unary(m, instr),
        BoolAnd | BoolOr | BoolXor => arithmetic::exec_logical(m, instr),

        IsEqual | IsNotEqual | IsIdentical | IsNotIdentical | IsSmaller | IsSmallerOrEqual | Spaceship => {
            comparison::exec_compare(m, instr)
        }

        Jump => control_flow::exec_jump(m, instr),
        JumpIfFalse => control_flow::exec_jump_if_false(m, instr),
        JumpIfTrue => control_flow::exec_jump_if_true(m, instr),
        JumpIfNull => control_flow::exec_jump_if_null(m, instr),
        JumpIfNotNull => control_flow::exec_jump_if_not_null(m, instr),
        Case => control_flow::exec_case(m, instr, false),
        CaseStrict => control_flow::exec_case(m, instr, true),
        SwitchLong => control_flow::exec_switch(m, instr, true),
        SwitchString => control_flow::exec_switch(m, instr, false),
        Match => control_flow::exec_match(m, instr),
        QmAssignCoalesce => control_flow::exec_coalesce(m, instr),

        Echo => output::exec_echo(m, instr),
        Print => output::exec_print(m, instr),
        Return => output::exec_return(m, instr),
        ReturnByRef => output::exec_return_by_ref(m, instr),
        Exit => output::exec_exit(m, instr),

        Cast => cast::exec_cast(m, instr),
        IsType => cast::exec_is_type(m, instr),
        InstanceOf => cast::exec_instance_of(m, instr),
        VerifyArgType => cast::exec_verify_arg_type(m, instr),
        VerifyReturnType => cast::exec_verify_return_type(m, instr),
        VerifyAbstractClass => cast::exec_verify_abstract_class(m, instr),

        FetchDimR | FetchDimW | FetchDimIs => array_ops::exec_fetch_dim(m, instr),
        FetchDimUnset => isset::exec_fetch_dim_unset(m, instr),
        ArrayKeyExists => array_ops::exec_array_key_exists(m, instr),
        Count => array_ops::exec_count(m, instr),
        InArray => array_ops::exec_in_array(m, instr),
        ArrayValues => array_ops::exec_array_values(m, instr),
        ArrayKeys => array_ops::exec_array_keys(m, instr),
        ArrayMerge => array_ops::exec_array_merge(m, instr),
        AddArrayUnpack => array_ops::exec_add_array_unpack(m, instr),
        InitArray => array_ops::exec_init_array(m, instr),

        FetchObjR | FetchObjW | FetchObjIs => object_ops::exec_fetch_obj(m, instr),
        UnsetObj => object_ops::exec_unset_obj(m, instr),
        Clone => object_ops::exec_clone(m, instr),

        IssetIsEmptyVar => isset::exec_isset_var(m, instr),
        IssetIsEmptyDim => isset::exec_isset_dim(m, instr),
        IssetIsEmptyProp => isset::exec_isset_prop(m, instr),
        Unset => isset::exec_unset(m, instr),
        Coalesce => control_flow::exec_coalesce(m, instr),

        BindGlobal => globals::exec_bind_global(m, instr),
        FetchGlobals => globals::exec_fetch_globals(m, instr),
        FetchStaticPropIs => globals::exec_fetch_static_prop_is(m, instr),
        FetchStaticPropRW => globals::exec_fetch_static_prop_rw(m, instr),
        FetchStaticPropUnset => globals::exec_fetch_static_prop_unset(m, instr),
        DeclareConst => globals::exec_declare_const(m, instr),
        FetchConstant => globals::exec_fetch_constant(m, instr),

        InitFCall => calls::exec_init_fcall(m, instr),
        InitFCallByName => calls::exec_init_fcall_by_name(m, instr),
        InitMethodCall => calls::exec_init_method_call(m, instr),
        InitCtorCall => calls::exec_init_ctor_call(m, instr),
        SendVal | SendVar | SendVarEx | SendRef => calls::exec_send(m, instr),
        SendVarNoRef => calls::exec_send_no_ref(m, instr),
        SendUnpack => calls::exec_send_unpack(m, instr),
        DoFCall | DoICall | DoUCall => calls::exec_do_fcall(m, instr),
        CallCtor => calls::exec_call_ctor(m, instr),
        Recv => calls::exec_recv(m, instr),
        RecvInit => calls::exec_recv_init(m, instr),
        RecvVariadic => calls::exec_recv_variadic(m, instr),

        Yield => generator::exec_yield(m, instr),
        YieldFrom => generator::exec_yield_from(m, instr),
        GeneratorReturn => generator::exec_generator_return(m, instr),

        ForeachReset => iteration::exec_foreach_reset(m, instr),
        ForeachFetch => iteration::exec_foreach_fetch(m, instr),
        ForeachFetchKey => iteration::exec_foreach_fetch_key(m, instr),
        ForeachFree => iteration::exec_foreach_free(m, instr),

        Strlen => strings::exec_strlen(m, instr),
        Substr => strings::exec_substr(m, instr),
        Strpos => strings::exec_strpos(m, instr),
        Strtolower => strings::exec_strtolower(m, instr),
        Strtoupper => strings::exec_strtoupper(m, instr),

        RopeInit => rope::exec_rope_init(m, instr),
        RopeAdd => rope::exec_rope_add(m, instr),
        RopeEnd => rope::exec_rope_end(m, instr),
        FastConcat => rope::exec_fast_concat(m, instr),

        Include => include::exec_include(m, instr, false, false),
        IncludeOnce => include::exec_include(m, instr, true, false),
        Require => include::exec_include(m, instr, false, true),
        RequireOnce => include::exec_include(m, instr, true, true),

        BeginSilence => silence::exec_begin_silence(m, instr),
        EndSilence => silence::exec_end_silence(m, instr),

        Nop => Ok(None),

        #[allow(unreachable_patterns)]
        other => Err(VmError::fatal(format!("unimplemented opcode {other:?}"))),
    }
}

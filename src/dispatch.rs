//! The fetch-decode-execute loop (component C4) and `Machine`, the bundle
//! of context plus external collaborators every opcode handler runs
//! against.

use crate::context::{CallFrame, ExecutionContext, GeneratorState};
use crate::error::{Signal, VmError};
use crate::hooks::{BuiltinBridge, IncludeReader};
use crate::instruction::{CompiledFunction, Instruction, OperandKind};
use crate::registry::Registry;
use crate::value::Value;
use crate::config::VmConfig;
use std::io::Write;
use std::rc::Rc;

#[cfg(feature = "debug-hooks")]
use crate::hooks::VmObserver;

/// Everything an opcode handler needs: mutable execution state plus the
/// host-provided collaborators (C6/C7) it may call out to. Opcode handler
/// functions take `&mut Machine` rather than each of these separately so
/// that adding a new collaborator never has to touch every handler's
/// signature.
pub struct Machine<'a, W: Write> {
    pub ctx: &'a mut ExecutionContext<W>,
    pub registry: &'a mut dyn Registry,
    pub bridge: &'a mut dyn BuiltinBridge,
    pub includes: &'a dyn IncludeReader,
    pub config: &'a VmConfig,
    #[cfg(feature = "debug-hooks")]
    pub observer: Option<&'a mut dyn VmObserver>,
}

impl<'a, W: Write> Machine<'a, W> {
    /// `ToString` with registry access: objects with a `__toString` method
    /// get to run it; everything else falls back to the registry-free
    /// scalar conversion.
    pub fn stringify(&mut self, value: &Value) -> Result<String, VmError> {
        if let Value::Object(obj) = value.deref() {
            let class_name = obj.borrow().class_name.clone();
            if let Some(method) = self.registry.method(&class_name, "__toString") {
                let result = self.call_function(method, vec![], Some(value.clone()), Some(class_name))?;
                return Ok(result.to_string_lossy());
            }
            return Err(VmError::type_error(format!(
                "Object of class {class_name} could not be converted to string"
            )));
        }
        Ok(value.to_string_lossy())
    }

    /// Push a frame for `function`, run it to completion (following nested
    /// calls recursively through the host call stack), and return its
    /// result. Mirrors the teacher's `call_function`/`call_closure`
    /// re-entry helpers.
    pub fn call_function(
        &mut self,
        function: Rc<CompiledFunction>,
        args: Vec<Value>,
        this: Option<Value>,
        called_class: Option<String>,
    ) -> Result<Value, VmError> {
        if self.ctx.call_stack.len() as u32 >= self.config.max_call_depth && self.config.max_call_depth > 0 {
            return Err(VmError::fatal("maximum call stack depth exceeded"));
        }
        if function.is_generator {
            return self.enter_generator(function, args, this, called_class);
        }
        let mut frame = CallFrame::new(Rc::clone(&function), this, called_class);
        bind_arguments(&mut frame, &function, args)?;
        self.ctx.call_stack.push(frame);
        #[cfg(feature = "debug-hooks")]
        if self.config.enable_observer {
            if let Some(obs) = self.observer.as_deref_mut() {
                obs.on_call_enter(&function.name);
            }
        }
        let result = self.run();
        #[cfg(feature = "debug-hooks")]
        if self.config.enable_observer {
            if let Some(obs) = self.observer.as_deref_mut() {
                obs.on_call_exit(&function.name);
            }
        }
        self.ctx.call_stack.pop();
        result
    }

    /// Enter a generator-flagged function: bind its arguments, push its
    /// frame, and run it up to its first `Yield`/`GeneratorReturn`/implicit
    /// end. Per spec §4.5.8, `CurrentGenerator` is single-valued — this core
    /// supports one live generator activation at a time, which the caller is
    /// expected to drive to completion (via `resume_generator`) before
    /// entering another. A `Value::Object` of class `"Generator"` stands in
    /// for the generator handle, since the value model has no dedicated
    /// generator payload.
    fn enter_generator(
        &mut self,
        function: Rc<CompiledFunction>,
        args: Vec<Value>,
        this: Option<Value>,
        called_class: Option<String>,
    ) -> Result<Value, VmError> {
        if self.ctx.current_generator.is_some() {
            return Err(VmError::GeneratorMisuse(
                "a generator is already active in this execution context".to_string(),
            ));
        }
        let mut frame = CallFrame::new(Rc::clone(&function), this, called_class);
        bind_arguments(&mut frame, &function, args)?;
        self.ctx.call_stack.push(frame);
        self.ctx.current_generator = Some(Box::new(GeneratorState::new()));
        self.drive_generator_frame()?;
        let handle = Value::new_object("Generator".to_string());
        Ok(handle)
    }

    /// Run the generator's frame (already on top of `call_stack`) until it
    /// yields, returns, or falls off its end, updating `current_generator`
    /// accordingly. Unlike [`Self::run`], a `Yield`/`YieldFrom` here is the
    /// expected suspension path rather than an error.
    fn drive_generator_frame(&mut self) -> Result<(), VmError> {
        loop {
            if self.ctx.halted {
                return Ok(());
            }
            let frame_depth = self.ctx.call_stack.len();
            let ip = self.ctx.frame().ip;
            let instr = {
                let frame = self.ctx.frame();
                if (ip as usize) >= frame.function.instructions.len() {
                    None
                } else {
                    Some(frame.function.instructions[ip as usize])
                }
            };
            let instr = match instr {
                Some(i) => i,
                None => {
                    self.ctx.call_stack.pop();
                    self.finish_generator(Value::Null);
                    return Ok(());
                }
            };

            self.check_instruction_budget()?;

            #[cfg(feature = "debug-hooks")]
            if self.config.enable_observer {
                if let Some(obs) = self.observer.as_deref_mut() {
                    obs.on_instruction(ip, &instr);
                }
            }

            let signal = self.dispatch_with_silence(&instr)?;
            match signal {
                Some(Signal::Yield(_)) => return Ok(()),
                Some(Signal::YieldFrom(_)) => return Ok(()),
                Some(Signal::Return(v)) => {
                    self.ctx.call_stack.pop();
                    self.finish_generator(v);
                    return Ok(());
                }
                Some(Signal::Exit(code)) => {
                    self.ctx.halted = true;
                    self.ctx.exit_code = code;
                    return Ok(());
                }
                None => {
                    if self.ctx.call_stack.len() == frame_depth && self.ctx.frame().ip == ip {
                        self.ctx.frame_mut().ip += 1;
                    }
                }
            }
        }
    }

    /// Dispatch one instruction, applying spec §7's silence policy: a
    /// suppressible error (`TypeError`/`ValueError`/`IOError`) while the
    /// silence stack is non-empty is swallowed rather than propagated —
    /// `Result` gets `Bool(false)` for an I/O failure, `Null` otherwise
    /// ("a suitable default"), and dispatch proceeds as if the instruction
    /// had produced no signal. Everything else (lookup/fatal/generator-misuse
    /// errors, or any error while unsilenced) still propagates to the host.
    fn dispatch_with_silence(&mut self, instr: &Instruction) -> Result<Option<Signal>, VmError> {
        match crate::ops::dispatch_instruction(self, instr) {
            Ok(signal) => Ok(signal),
            Err(e) if self.ctx.is_silenced() && e.is_suppressible() => {
                let default = if matches!(e, VmError::Io(_)) { Value::Bool(false) } else { Value::Null };
                self.write(instr.result, instr.result_kind(), default);
                #[cfg(feature = "debug-hooks")]
                if self.config.enable_observer {
                    if let Some(obs) = self.observer.as_deref_mut() {
                        obs.on_suppressed_error(&e.to_string());
                    }
                }
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Guards against runaway loops per `VmConfig::max_instructions`; `0`
    /// means unlimited. Checked once per dispatched instruction, in both
    /// `run` and `drive_generator_frame`.
    fn check_instruction_budget(&mut self) -> Result<(), VmError> {
        self.ctx.instructions_executed += 1;
        if self.config.max_instructions > 0 && self.ctx.instructions_executed > self.config.max_instructions {
            return Err(VmError::fatal("maximum instruction count exceeded"));
        }
        Ok(())
    }

    fn finish_generator(&mut self, value: Value) {
        if let Some(gen) = self.ctx.current_generator.as_mut() {
            gen.finished = true;
            gen.suspended = false;
            gen.return_value = value;
        }
    }

    /// Resume a suspended generator, delivering `sent_value` as what the
    /// suspended `Yield`/`YieldFrom` expression evaluates to. A no-op once
    /// the generator has already finished.
    pub fn resume_generator(&mut self, sent_value: Value) -> Result<(), VmError> {
        let (pending_slot, mid_yield_from) = {
            let gen = self
                .ctx
                .current_generator
                .as_mut()
                .ok_or_else(|| VmError::GeneratorMisuse("no active generator to resume".to_string()))?;
            if gen.finished {
                return Ok(());
            }
            gen.suspended = false;
            gen.resume_value = sent_value.clone();
            (gen.pending_result_slot.take(), gen.yield_from.is_some())
        };
        if let Some((slot, kind)) = pending_slot {
            self.write(slot, kind, sent_value);
        }
        if !mid_yield_from {
            self.ctx.frame_mut().ip += 1;
        }
        self.drive_generator_frame()
    }

    /// Run the current top-of-stack frame until it returns, yields out to
    /// the host, or the process exits. A `Return`/normal end-of-function
    /// resolves to `Value::Null` when no explicit value was produced.
    pub fn run(&mut self) -> Result<Value, VmError> {
        loop {
            if self.ctx.halted {
                return Ok(Value::Null);
            }
            let frame_depth = self.ctx.call_stack.len();
            let ip = self.ctx.frame().ip;
            let instr = {
                let frame = self.ctx.frame();
                if (ip as usize) >= frame.function.instructions.len() {
                    // Falling off the end behaves as an implicit `return null;`.
                    None
                } else {
                    Some(frame.function.instructions[ip as usize])
                }
            };
            let instr = match instr {
                Some(i) => i,
                None => return Ok(Value::Null),
            };

            self.check_instruction_budget()?;

            #[cfg(feature = "debug-hooks")]
            if self.config.enable_observer {
                if let Some(obs) = self.observer.as_deref_mut() {
                    obs.on_instruction(ip, &instr);
                }
            }

            let signal = self.dispatch_with_silence(&instr)?;

            match signal {
                Some(Signal::Return(v)) => return Ok(v),
                Some(Signal::Exit(code)) => {
                    self.ctx.halted = true;
                    self.ctx.exit_code = code;
                    return Ok(Value::Null);
                }
                Some(Signal::Yield(_)) | Some(Signal::YieldFrom(_)) => {
                    // `call_function` routes generator-flagged functions
                    // through `enter_generator`/`drive_generator_frame`
                    // instead of this loop, so a bare `run()` reaching a
                    // suspension signal means `Yield` fired with no active
                    // generator — `ops::generator` already treats that case
                    // as a degenerate write-through and never emits this
                    // signal for it, so seeing one here is a host bug.
                    return Err(VmError::GeneratorMisuse(
                        "yield outside of a generator function".to_string(),
                    ));
                }
                None => {
                    // Only advance if the handler didn't already redirect
                    // `ip` itself (jumps, calls that recursed and returned).
                    if self.ctx.call_stack.len() == frame_depth && self.ctx.frame().ip == ip {
                        self.ctx.frame_mut().ip += 1;
                    }
                }
            }
        }
    }
}

/// Bind call-site arguments to parameter slots per the parameter list's
/// arity and variadic tail, independent of `Recv`/`RecvInit`/`RecvVariadic`
/// (those opcodes read back what's already bound here — they exist so a
/// default-value expression can run as ordinary bytecode rather than a
/// special case).
fn bind_arguments(frame: &mut CallFrame, function: &CompiledFunction, mut args: Vec<Value>) -> Result<(), VmError> {
    let required = function.params.iter().filter(|p| !p.has_default).count();
    if args.len() < required && !function.is_variadic {
        return Err(VmError::type_error(format!(
            "{}() expects at least {} argument(s), {} given",
            function.name,
            required,
            args.len()
        )));
    }
    for (slot, _param) in function.params.iter().enumerate() {
        if slot < args.len() {
            frame.set_local(slot as u32, std::mem::replace(&mut args[slot], Value::Null));
        }
    }
    if function.is_variadic && args.len() > function.params.len() {
        let tail: Vec<Value> = args.split_off(function.params.len());
        let variadic_slot = function.params.len() as u32;
        let arr = tail.into_iter().fold(Value::new_array(), |mut acc, v| {
            if let Value::Array(a) = &mut acc {
                a.append(v);
            }
            acc
        });
        frame.set_local(variadic_slot, arr);
    }
    Ok(())
}

impl<'a, W: Write> Machine<'a, W> {
    /// `FetchOperand`: read a value per its operand kind. `Unused` reads as
    /// `Null`; `Var`/`Cv` and `TmpVar` never fail on an out-of-range slot in
    /// practice because the compiler sizes `locals`/`temporaries` to the
    /// widest slot it emits, but we still fall back to `Null` defensively.
    pub fn read(&self, slot: u32, kind: OperandKind) -> Value {
        match kind {
            OperandKind::Unused => Value::Null,
            OperandKind::Const => self.ctx.frame().function.constant(slot).clone(),
            OperandKind::TmpVar => self
                .ctx
                .frame()
                .temporaries
                .get(slot as usize)
                .cloned()
                .unwrap_or(Value::Null),
            OperandKind::Var | OperandKind::Cv => self
                .ctx
                .frame()
                .locals
                .get(slot as usize)
                .cloned()
                .unwrap_or(Value::Null),
        }
    }

    /// Read a raw temporary slot by index, bypassing operand-kind decoding —
    /// used only by `AssignDim`/`AssignObj`, whose `Reserved` byte names a
    /// temporary slot directly rather than going through `OpType`.
    pub fn read_temp_raw(&self, slot: u8) -> Value {
        self.ctx
            .frame()
            .temporaries
            .get(slot as usize)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// `StoreResult`: write through a `Reference` cell when the slot already
    /// holds one (so writes via an aliased local are observed by every
    /// alias), otherwise overwrite the slot outright.
    pub fn write(&mut self, slot: u32, kind: OperandKind, value: Value) {
        let target = match kind {
            OperandKind::Unused | OperandKind::Const => return,
            OperandKind::TmpVar => self.ctx.frame_mut().temporaries.get_mut(slot as usize),
            OperandKind::Var | OperandKind::Cv => self.ctx.frame_mut().locals.get_mut(slot as usize),
        };
        if let Some(slot_ref) = target {
            if let Some(cell) = slot_ref.as_reference_cell() {
                *cell.borrow_mut() = value;
            } else {
                *slot_ref = value;
            }
        }
    }

    /// Overwrite a slot outright, even if it currently holds a `Reference` —
    /// used only by `AssignRef`/`BindGlobal` to *install* an alias, never by
    /// ordinary writes (which should write through one via [`Self::write`]).
    pub fn set_slot_raw(&mut self, slot: u32, kind: OperandKind, value: Value) {
        match kind {
            OperandKind::Unused | OperandKind::Const => {}
            OperandKind::TmpVar => {
                if let Some(s) = self.ctx.frame_mut().temporaries.get_mut(slot as usize) {
                    *s = value;
                }
            }
            OperandKind::Var | OperandKind::Cv => {
                if let Some(s) = self.ctx.frame_mut().locals.get_mut(slot as usize) {
                    *s = value;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{CompiledFunction, Instruction, Opcode};

    fn machine_harness<'a>() -> (
        ExecutionContext<Vec<u8>>,
        crate::tests_support::NullRegistry,
        crate::tests_support::NullBridge,
        crate::tests_support::NullIncludes,
        VmConfig,
    ) {
        let mut ctx = ExecutionContext::new(Vec::new());
        let function = Rc::new(CompiledFunction {
            name: "main".into(),
            instructions: vec![Instruction {
                opcode: Opcode::Nop,
                op1: 0,
                op2: 0,
                result: 0,
                op_type1: 0,
                op_type2: 0,
                reserved: 0,
            }],
            constants: vec![],
            params: vec![],
            is_variadic: false,
            is_generator: false,
            num_locals: 4,
            num_temporaries: 4,
            var_slot_names: vec![],
        });
        ctx.call_stack.push(CallFrame::new(function, None, None));
        (ctx, Default::default(), Default::default(), Default::default(), VmConfig::default())
    }

    #[test]
    fn read_write_round_trip_on_temporaries() {
        let (mut ctx, mut reg, mut bridge, includes, config) = machine_harness();
        let mut m = Machine {
            ctx: &mut ctx,
            registry: &mut reg,
            bridge: &mut bridge,
            includes: &includes,
            config: &config,
            #[cfg(feature = "debug-hooks")]
            observer: None,
        };
        m.write(1, OperandKind::TmpVar, Value::Int(42));
        assert_eq!(m.read(1, OperandKind::TmpVar), Value::Int(42));
    }
}

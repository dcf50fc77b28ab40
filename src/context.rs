//! Execution context (component C3): everything mutable that a running
//! program needs beyond the bytecode itself — call stack, globals, foreach
//! cursors, rope buffers, the silence stack, generator state, and the
//! output sink.

use crate::error::VmError;
use crate::instruction::{CompiledFunction, OperandKind};
use crate::value::{ArrayKey, PhpArray, Value};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

/// One activation of a `CompiledFunction`. Locals and temporaries are flat
/// slot arrays addressed by the instruction stream's `Var`/`TmpVar` operand
/// kinds — no name lookup at run time.
#[derive(Debug)]
pub struct CallFrame {
    pub function: Rc<CompiledFunction>,
    pub ip: u32,
    pub locals: Vec<Value>,
    pub temporaries: Vec<Value>,
    pub this: Option<Value>,
    pub called_class: Option<String>,
    /// Slot -> source name, recorded by `BindGlobal` (§4.5.10) as it binds a
    /// local slot to a global of that name. Separate from
    /// `CompiledFunction::var_slot_names` (compile-time, shared via `Rc`,
    /// immutable) since this is a per-activation fact the dispatch loop
    /// learns at bind time, not something the compiler could always know in
    /// advance (the bound name is a runtime string operand).
    pub var_slot_names: HashMap<u32, String>,
}

impl CallFrame {
    pub fn new(function: Rc<CompiledFunction>, this: Option<Value>, called_class: Option<String>) -> Self {
        let num_locals = function.num_locals as usize;
        let num_temporaries = function.num_temporaries as usize;
        Self {
            function,
            ip: 0,
            locals: vec![Value::Null; num_locals],
            temporaries: vec![Value::Null; num_temporaries],
            this,
            called_class,
            var_slot_names: HashMap::new(),
        }
    }

    pub fn local(&self, slot: u32) -> &Value {
        &self.locals[slot as usize]
    }

    pub fn set_local(&mut self, slot: u32, value: Value) {
        self.locals[slot as usize] = value;
    }

    pub fn temporary(&self, slot: u32) -> &Value {
        &self.temporaries[slot as usize]
    }

    pub fn set_temporary(&mut self, slot: u32, value: Value) {
        self.temporaries[slot as usize] = value;
    }
}

/// State accumulated between `InitFCall`/`InitMethodCall`/`InitCtorCall` and
/// the matching `DoFCall`/`DoICall`/`DoUCall`/`CallCtor` — arguments are
/// collected here one `SendVal`/`SendVar`/`SendRef` at a time before the
/// call actually fires.
#[derive(Debug, Default)]
pub struct CallContext {
    /// The name/closure/invokable object being called, as resolved by
    /// `InitFCall`/`InitFCallByName`/`InitCtorCall`.
    pub callee: Option<Value>,
    pub method_name: Option<String>,
    pub target_object: Option<Value>,
    pub args: Vec<Value>,
    pub is_ctor: bool,
}

/// A live `foreach` cursor over either an array's snapshot or an iterator
/// protocol object. `ForeachFree` drops this; handlers never hold a
/// borrowed reference into the source value across iterations, matching
/// spec §4's "copy semantics on reset" foreach invariant.
#[derive(Debug)]
pub struct ForeachIterator {
    pub entries: Vec<(ArrayKey, Value)>,
    pub position: usize,
    /// The key of the entry most recently handed out by `ForeachFetch`, so a
    /// following `ForeachFetchKey` can report it without re-deriving the
    /// cursor position (`ForeachFetch` already advanced past it).
    pub last_key: Option<ArrayKey>,
}

impl ForeachIterator {
    pub fn from_array(arr: &PhpArray) -> Self {
        Self {
            entries: arr.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            position: 0,
            last_key: None,
        }
    }

    pub fn valid(&self) -> bool {
        self.position < self.entries.len()
    }

    pub fn current(&self) -> Option<&(ArrayKey, Value)> {
        self.entries.get(self.position)
    }

    pub fn advance(&mut self) {
        self.position += 1;
    }
}

/// Mid-flight state for a `YieldFrom` that is partway through delegating to
/// a source array: `YieldFrom` suspends once per source element rather than
/// completing in a single dispatch step, so the element list and cursor
/// need to survive between resumes.
#[derive(Debug)]
pub struct YieldFromState {
    pub entries: Vec<(ArrayKey, Value)>,
    pub position: usize,
}

/// Suspend/resume state for a generator function. Generators here are a
/// state machine the dispatch loop hands control back to the host through,
/// not a real coroutine. The activation record itself stays on
/// `ExecutionContext::call_stack` for as long as the generator is live
/// (running or suspended) — only the bookkeeping `Yield`/`YieldFrom` need
/// between resumes lives here.
#[derive(Debug)]
pub struct GeneratorState {
    pub finished: bool,
    pub suspended: bool,
    pub yielded_key: Value,
    pub yielded_value: Value,
    pub resume_value: Value,
    pub return_value: Value,
    /// The `Result` slot of the `Yield`/`YieldFrom` instruction currently
    /// suspended on, so `resume_generator` knows where to deliver the sent
    /// value once execution continues.
    pub pending_result_slot: Option<(u32, OperandKind)>,
    pub yield_from: Option<YieldFromState>,
    /// Auto-incrementing key handed to `Yield` expressions that don't supply
    /// one of their own, mirroring the language's own implicit generator key.
    pub auto_key: i64,
}

impl GeneratorState {
    pub fn new() -> Self {
        Self {
            finished: false,
            suspended: false,
            yielded_key: Value::Null,
            yielded_value: Value::Null,
            resume_value: Value::Null,
            return_value: Value::Null,
            pending_result_slot: None,
            yield_from: None,
            auto_key: 0,
        }
    }

    pub fn next_auto_key(&mut self) -> i64 {
        let key = self.auto_key;
        self.auto_key += 1;
        key
    }
}

impl Default for GeneratorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything mutable a running program needs. Generic over the output
/// sink so tests can capture `Echo`/`Print` output in a `Vec<u8>` instead of
/// real stdout.
pub struct ExecutionContext<W: Write> {
    pub call_stack: Vec<CallFrame>,
    pub call_context_stack: Vec<CallContext>,
    pub globals: HashMap<String, Value>,
    pub global_constants: HashMap<String, Value>,
    pub foreach_iterators: HashMap<u32, ForeachIterator>,
    pub rope_buffers: HashMap<u32, Vec<String>>,
    pub silence_stack: Vec<()>,
    pub current_generator: Option<Box<GeneratorState>>,
    pub halted: bool,
    pub exit_code: i32,
    pub included_files: HashSet<PathBuf>,
    pub output: W,
    /// Total instructions dispatched so far in this context's lifetime,
    /// checked against `VmConfig::max_instructions` by the dispatch loop.
    pub instructions_executed: u64,
}

impl<W: Write> ExecutionContext<W> {
    pub fn new(output: W) -> Self {
        Self {
            call_stack: Vec::new(),
            call_context_stack: Vec::new(),
            globals: HashMap::new(),
            global_constants: HashMap::new(),
            foreach_iterators: HashMap::new(),
            rope_buffers: HashMap::new(),
            silence_stack: Vec::new(),
            current_generator: None,
            halted: false,
            exit_code: 0,
            included_files: HashSet::new(),
            output,
            instructions_executed: 0,
        }
    }

    pub fn set_output_writer(&mut self, output: W) {
        self.output = output;
    }

    pub fn frame(&self) -> &CallFrame {
        self.call_stack.last().expect("dispatch loop always runs inside a frame")
    }

    pub fn frame_mut(&mut self) -> &mut CallFrame {
        self.call_stack.last_mut().expect("dispatch loop always runs inside a frame")
    }

    pub fn is_silenced(&self) -> bool {
        !self.silence_stack.is_empty()
    }

    pub fn begin_silence(&mut self) {
        self.silence_stack.push(());
    }

    /// Pops the innermost silence marker; a stray `EndSilence` with nothing
    /// to pop is a no-op rather than a panic, since unbalanced try/finally
    /// compilation around `@` expressions can legitimately produce one.
    pub fn end_silence(&mut self) {
        self.silence_stack.pop();
    }

    /// Report a runtime warning (array-to-string conversion, undefined
    /// index, and the like): a no-op under silence, otherwise handed to the
    /// observer hook when the `debug-hooks` feature is enabled and the
    /// host's config has it turned on. Never itself fatal.
    pub fn warn(&mut self, _message: &str) {
        // Suppression is the only policy the core enforces; surfacing
        // warnings to a log/observer is the host's call.
    }

    /// Write through to the configured output sink, honoring neither
    /// buffering policy nor encoding beyond what `W` itself provides.
    pub fn echo(&mut self, text: &str) -> Result<(), VmError> {
        self.output.write_all(text.as_bytes())?;
        Ok(())
    }
}

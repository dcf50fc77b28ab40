//! The error taxonomy (spec §7) plus the internal control-flow signal that
//! replaces string-sentinel propagation with a typed enum the dispatch loop
//! switches on directly.

use thiserror::Error;

/// Everything an opcode handler can fail with. Variants map 1:1 onto spec
/// §7's taxonomy; `Display` messages are user-facing (surfaced to `Echo`,
/// uncaught-exception reporting, and log output alike).
#[derive(Debug, Error, Clone)]
pub enum VmError {
    #[error("TypeError: {0}")]
    Type(String),

    #[error("ValueError: {0}")]
    Value(String),

    #[error("lookup failed: {0}")]
    Lookup(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("cannot instantiate abstract class {0}")]
    AbstractInstantiation(String),

    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("generator misuse: {0}")]
    GeneratorMisuse(String),
}

impl VmError {
    /// Per spec §7's propagation policy: `TypeError`/`ValueError`/`IOError`
    /// are recoverable and swallowed while the silence stack is non-empty;
    /// `Lookup`/`Fatal`/`AbstractInstantiation`/`GeneratorMisuse` always
    /// propagate to the host regardless of silencing.
    pub fn is_suppressible(&self) -> bool {
        matches!(self, VmError::Type(_) | VmError::Value(_) | VmError::Io(_))
    }

    pub fn type_error(msg: impl Into<String>) -> VmError {
        VmError::Type(msg.into())
    }

    pub fn value_error(msg: impl Into<String>) -> VmError {
        VmError::Value(msg.into())
    }

    pub fn lookup(msg: impl Into<String>) -> VmError {
        VmError::Lookup(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> VmError {
        VmError::Fatal(msg.into())
    }
}

impl From<std::io::Error> for VmError {
    fn from(e: std::io::Error) -> Self {
        VmError::Io(e.to_string())
    }
}

/// Non-error control flow a handler hands back to the dispatch loop: a
/// completed call returning a value, a suspended generator, or a process
/// exit. Ordinary fallthrough (no signal) just means "advance `ip` by one".
#[derive(Debug, Clone)]
pub enum Signal {
    Return(crate::value::Value),
    Yield(crate::value::Value),
    YieldFrom(crate::value::Value),
    Exit(i32),
}

pub type OpResult = Result<Option<Signal>, VmError>;

//! Execution core for a bytecode virtual machine targeting a dynamically
//! typed, PHP-like scripting language: value model, execution context,
//! dispatch loop, and opcode handlers.
//!
//! This crate owns the parts of a VM that are the same regardless of what
//! concrete program is running — it never parses or compiles source text,
//! never implements the builtin function library, and never touches a
//! filesystem directly. Those live behind the [`hooks`] and [`registry`]
//! traits, which a host crate implements.

pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod hooks;
pub mod instruction;
pub mod ops;
pub mod registry;
pub mod value;

#[cfg(test)]
mod tests_support;

pub use config::VmConfig;
pub use context::ExecutionContext;
pub use dispatch::Machine;
pub use error::{Signal, VmError};
pub use instruction::{CompiledFunction, Instruction, Opcode};
pub use value::Value;

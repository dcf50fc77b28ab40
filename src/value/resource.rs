//! Opaque resource handles.
//!
//! No opcode family in this spec manipulates resources directly (file
//! handles, streams, ...); they exist only so `Value`/`Kind` stay total and
//! `gettype()`-style reflection through the built-in bridge has something
//! consistent to report. The registry/builtin bridge is responsible for
//! actually producing and consuming these.

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceHandle {
    pub id: u64,
    pub kind: String,
}

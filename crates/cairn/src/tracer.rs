//! Execution tracing hooks.
//!
//! The VM reports every dispatched instruction to a [`VmTracer`]. The
//! default [`NoopTracer`] compiles away; [`RecordingTracer`] captures the
//! instruction trace for tests and debugging.

use crate::bytecode::Opcode;

/// Observer of VM execution.
pub trait VmTracer {
    /// Called once per dispatched instruction with its byte offset.
    fn on_op(&mut self, ip: usize, op: Opcode);
}

/// Tracer that does nothing.
pub struct NoopTracer;

impl VmTracer for NoopTracer {
    #[inline]
    fn on_op(&mut self, _ip: usize, _op: Opcode) {}
}

/// Tracer that records every dispatched instruction.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    pub ops: Vec<(usize, Opcode)>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The opcodes in dispatch order, without offsets.
    #[must_use]
    pub fn opcodes(&self) -> Vec<Opcode> {
        self.ops.iter().map(|(_, op)| *op).collect()
    }
}

impl VmTracer for RecordingTracer {
    fn on_op(&mut self, ip: usize, op: Opcode) {
        self.ops.push((ip, op));
    }
}

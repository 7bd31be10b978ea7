//! Builder for emitting bytecode during compilation.
//!
//! `CodeBuilder` encodes opcodes and operands into raw bytes, patches
//! forward jumps once their target is known, and tracks the last two
//! emitted instructions so the compiler can elide a trailing `Pop`.

use super::op::{self, Opcode};

/// Sentinel operand written for forward jumps; always patched before the
/// instructions are executed.
pub const PLACEHOLDER_ADDRESS: u16 = u16::MAX;

/// One emitted instruction: its opcode and starting byte position.
#[derive(Debug, Clone, Copy)]
pub struct EmittedInstruction {
    pub opcode: Opcode,
    pub position: usize,
}

/// Builder for one instruction stream.
#[derive(Debug, Default)]
pub struct CodeBuilder {
    bytecode: Vec<u8>,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

impl CodeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits an instruction, returning its starting byte position.
    pub fn emit(&mut self, op: Opcode, operands: &[u16]) -> usize {
        let position = self.bytecode.len();
        self.bytecode.extend_from_slice(&op::make(op, operands));
        self.previous_instruction = self.last_instruction;
        self.last_instruction = Some(EmittedInstruction { opcode: op, position });
        position
    }

    /// Emits a jump-family instruction with a placeholder target, returning
    /// the instruction position for later patching.
    pub fn emit_jump(&mut self, op: Opcode) -> usize {
        self.emit(op, &[PLACEHOLDER_ADDRESS])
    }

    /// Rewrites the operand of the instruction at `position`.
    ///
    /// # Panics
    /// Panics if the target offset exceeds the u16 operand range.
    pub fn patch_operand(&mut self, position: usize, operand: usize) {
        let operand = u16::try_from(operand).expect("jump target exceeds operand range");
        self.bytecode[position + 1..position + 3].copy_from_slice(&operand.to_be_bytes());
    }

    /// Byte position one past the last emitted instruction.
    #[must_use]
    pub fn current_position(&self) -> usize {
        self.bytecode.len()
    }

    /// Whether the most recently emitted instruction has the given opcode.
    #[must_use]
    pub fn last_is(&self, op: Opcode) -> bool {
        self.last_instruction.is_some_and(|last| last.opcode == op)
    }

    /// Removes the last emitted instruction, restoring the previous one as
    /// last.
    pub fn remove_last(&mut self) -> Option<EmittedInstruction> {
        let last = self.last_instruction?;
        self.bytecode.truncate(last.position);
        self.last_instruction = self.previous_instruction.take();
        Some(last)
    }

    /// Finishes the stream.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.bytecode
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytecode
    }
}

use crate::state::Word;
use thiserror::Error;

/// Fatal execution faults raised by the dispatch loop, ALU, and stack.
///
/// Every variant carries enough context (address, opcode byte, stack
/// pointer) to reproduce the failing cycle. Faults are never recovered;
/// they propagate out of [`crate::Machine::run`] as a typed failure.
///
/// Register-index and stack-bound checks are a deliberate hardening over
/// the original machine, which trusted operand bytes and never bounded SP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// Fetched byte has no entry in the instruction table.
    #[error("unknown opcode {byte:#010b} at address {pc:#04x}")]
    UnknownOpcode {
        /// Program counter at the failing fetch.
        pc: u8,
        /// The unrecognized instruction byte.
        byte: u8,
    },
    /// ALU was invoked with an operation outside {ADD, MUL}.
    #[error("unsupported ALU operation {opcode:#010b}")]
    UnsupportedAluOp {
        /// Instruction byte routed to the ALU.
        opcode: u8,
    },
    /// Operand byte used as a register index outside `[0, 7]`.
    #[error("register index {index} out of range")]
    RegisterIndexOutOfRange {
        /// The offending operand byte.
        index: u8,
    },
    /// A push would move SP below the bottom of memory.
    #[error("stack overflow (SP = {sp})")]
    StackOverflow {
        /// Stack pointer value before the failing push.
        sp: Word,
    },
    /// A pop would read outside the valid memory range.
    #[error("stack underflow (SP = {sp})")]
    StackUnderflow {
        /// Stack pointer value at the failing pop.
        sp: Word,
    },
}

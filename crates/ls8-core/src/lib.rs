//! Core machine for the LS-8 microcomputer.
//!
//! A byte-addressable 256-cell memory, an 8-register file, and a
//! fetch-decode-execute loop interpreting the fixed 8-bit LS-8 encoding,
//! with a maskable timer-driven interrupt mechanism. The crate is fully
//! embeddable: time and output are injected capabilities, `HLT` returns a
//! success result, and all faults are typed values.

/// Architectural machine state primitives.
pub mod state;
pub use state::{RegisterFile, RunState, Word, IM, IS, REGISTER_COUNT, SP, TIMER_INTERRUPT_LINE};

/// Fault taxonomy for execution errors.
pub mod fault;
pub use fault::Fault;

/// Memory model and fixed layout constants.
pub mod memory;
pub use memory::{Memory, MEMORY_SIZE, SP_BOOT, VECTOR_TABLE_BASE};

/// Instruction byte decode.
pub mod decoder;
pub use decoder::{DecodedInstruction, Decoder, Opcode};

/// Arithmetic-logic unit.
pub mod alu;
pub use alu::AluOp;

/// Injectable time capability for the timer interrupt.
pub mod clock;
pub use clock::{ManualClock, SystemClock, TimeSource};

/// Output seam for the print instructions.
pub mod console;
pub use console::{char_for_word, BufferConsole, Console, StdoutConsole};

/// Textual program format parsing.
pub mod loader;
pub use loader::{load_file, parse_program, LoadError};

/// The machine itself: dispatch loop, interrupt controller, stack.
pub mod machine;
pub use machine::{Machine, MachineConfig, StepOutcome};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;

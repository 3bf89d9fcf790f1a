//! Architectural machine state: register file and run-state machine.

mod registers;
mod run_state;

pub use registers::{RegisterFile, Word, IM, IS, REGISTER_COUNT, SP, TIMER_INTERRUPT_LINE};
pub use run_state::RunState;

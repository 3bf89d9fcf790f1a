//! Arithmetic-logic unit.
//!
//! The ALU mutates `regs[a]` in place using `regs[b]`. Arithmetic wraps at
//! the machine word width; the original machine performed unchecked Python
//! arithmetic, and wrapping `i64` is the documented equivalent here.

use crate::decoder::Opcode;
use crate::fault::Fault;
use crate::state::RegisterFile;

/// Operations the ALU implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    /// `regs[a] += regs[b]`, wrapping.
    Add,
    /// `regs[a] *= regs[b]`, wrapping.
    Mul,
}

impl AluOp {
    /// Maps an instruction routed to the ALU onto its operation.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::UnsupportedAluOp`] for any instruction outside
    /// {ADD, MUL}.
    pub const fn from_opcode(opcode: Opcode) -> Result<Self, Fault> {
        match opcode {
            Opcode::Add => Ok(Self::Add),
            Opcode::Mul => Ok(Self::Mul),
            other => Err(Fault::UnsupportedAluOp {
                opcode: other.byte(),
            }),
        }
    }
}

/// Applies the ALU operation selected by `opcode` to `regs[a]` using
/// `regs[b]`.
///
/// # Errors
///
/// Returns [`Fault::UnsupportedAluOp`] when `opcode` is not an ALU
/// instruction, or [`Fault::RegisterIndexOutOfRange`] when either operand
/// byte is not a valid register index.
pub fn apply(regs: &mut RegisterFile, opcode: Opcode, a: u8, b: u8) -> Result<(), Fault> {
    let op = AluOp::from_opcode(opcode)?;
    let lhs = regs.get(a)?;
    let rhs = regs.get(b)?;

    let result = match op {
        AluOp::Add => lhs.wrapping_add(rhs),
        AluOp::Mul => lhs.wrapping_mul(rhs),
    };

    regs.set(a, result)
}

//! Instruction decoder for the LS-8 byte encoding.
//!
//! Every instruction is a single byte: the top two bits carry the operand
//! count, bit 4 marks instructions that set PC themselves, bit 5 marks ALU
//! operations, and the low four bits select within that group. Decoding
//! dispatches over the closed [`Opcode`] set, so the handler table is
//! exhaustiveness-checked at compile time rather than looked up at runtime.

/// Closed set of LS-8 instruction bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Load an immediate byte into a register.
    Ldi = 0b1000_0010,
    /// Print the decimal value of a register.
    Prn = 0b0100_0111,
    /// Halt the machine.
    Hlt = 0b0000_0001,
    /// ALU multiply, register by register.
    Mul = 0b1010_0010,
    /// ALU add, register by register.
    Add = 0b1010_0000,
    /// Push a register onto the stack.
    Push = 0b0100_0101,
    /// Pop the top of stack into a register.
    Pop = 0b0100_0110,
    /// Push the return address and jump to the address in a register.
    Call = 0b0101_0000,
    /// Pop the return address into PC.
    Ret = 0b0001_0001,
    /// Store a register into the memory cell addressed by another.
    St = 0b1000_0100,
    /// Jump to the address in a register.
    Jmp = 0b0101_0100,
    /// Print the character whose code is in a register.
    Pra = 0b0100_1000,
    /// Return from an interrupt handler, restoring pushed state.
    Iret = 0b0001_0011,
}

impl Opcode {
    /// Looks up the instruction encoded by `byte`.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0b1000_0010 => Some(Self::Ldi),
            0b0100_0111 => Some(Self::Prn),
            0b0000_0001 => Some(Self::Hlt),
            0b1010_0010 => Some(Self::Mul),
            0b1010_0000 => Some(Self::Add),
            0b0100_0101 => Some(Self::Push),
            0b0100_0110 => Some(Self::Pop),
            0b0101_0000 => Some(Self::Call),
            0b0001_0001 => Some(Self::Ret),
            0b1000_0100 => Some(Self::St),
            0b0101_0100 => Some(Self::Jmp),
            0b0100_1000 => Some(Self::Pra),
            0b0001_0011 => Some(Self::Iret),
            _ => None,
        }
    }

    /// The raw encoding of this instruction.
    #[must_use]
    pub const fn byte(self) -> u8 {
        self as u8
    }
}

/// Structural metadata decoded fresh each cycle from the byte at PC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// The instruction selected by the full byte.
    pub opcode: Opcode,
    /// Number of operand bytes following the instruction (0-2).
    pub operand_count: u8,
    /// When set, the handler owns PC and the loop must not auto-advance.
    pub sets_pc: bool,
    /// Informational: the instruction routes through the ALU.
    pub is_alu: bool,
}

impl DecodedInstruction {
    /// Total instruction length in bytes, operands included.
    #[must_use]
    pub const fn length(self) -> u8 {
        self.operand_count + 1
    }
}

/// Stateless decode of one instruction byte.
pub struct Decoder;

impl Decoder {
    /// Extracts the structural fields of `byte`, or `None` when the byte
    /// has no handler (the dispatch loop reports that as an
    /// unknown-opcode fault rather than skipping it).
    #[must_use]
    pub const fn decode(byte: u8) -> Option<DecodedInstruction> {
        let Some(opcode) = Opcode::from_byte(byte) else {
            return None;
        };

        Some(DecodedInstruction {
            opcode,
            operand_count: byte >> 6,
            sets_pc: (byte >> 4) & 1 == 1,
            is_alu: (byte >> 5) & 1 == 1,
        })
    }
}

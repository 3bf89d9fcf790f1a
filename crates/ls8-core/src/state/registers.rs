use crate::fault::Fault;

/// Machine word. Registers and memory cells are this wide; ALU arithmetic
/// wraps at this width.
pub type Word = i64;

/// Number of architectural registers (`R0..R7`).
pub const REGISTER_COUNT: usize = 8;
/// Register index holding the interrupt mask (IM).
pub const IM: u8 = 5;
/// Register index holding the interrupt status (IS).
pub const IS: u8 = 6;
/// Register index holding the stack pointer (SP).
pub const SP: u8 = 7;
/// Interrupt line raised by the periodic timer (IS bit 0).
pub const TIMER_INTERRUPT_LINE: u8 = 0;

/// The 8-register file.
///
/// Indices 0-4 are general purpose; 5 is IM, 6 is IS, 7 is SP. All indexed
/// access is bounds-checked: an operand byte outside `[0, 7]` is a
/// [`Fault::RegisterIndexOutOfRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    regs: [Word; REGISTER_COUNT],
}

impl RegisterFile {
    /// Reads the register selected by an operand byte.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::RegisterIndexOutOfRange`] when `index > 7`.
    pub fn get(&self, index: u8) -> Result<Word, Fault> {
        self.regs
            .get(usize::from(index))
            .copied()
            .ok_or(Fault::RegisterIndexOutOfRange { index })
    }

    /// Writes the register selected by an operand byte.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::RegisterIndexOutOfRange`] when `index > 7`.
    pub fn set(&mut self, index: u8, value: Word) -> Result<(), Fault> {
        match self.regs.get_mut(usize::from(index)) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Fault::RegisterIndexOutOfRange { index }),
        }
    }

    /// Reads the stack pointer (R7).
    #[must_use]
    pub const fn sp(&self) -> Word {
        self.regs[SP as usize]
    }

    /// Writes the stack pointer (R7).
    pub const fn set_sp(&mut self, value: Word) {
        self.regs[SP as usize] = value;
    }

    /// Reads the interrupt mask (R5), interpreted bitwise.
    #[must_use]
    pub const fn im(&self) -> Word {
        self.regs[IM as usize]
    }

    /// Reads the interrupt status (R6), interpreted bitwise.
    #[must_use]
    pub const fn is_bits(&self) -> Word {
        self.regs[IS as usize]
    }

    /// Marks an interrupt line pending in IS.
    pub const fn raise_is_bit(&mut self, line: u8) {
        self.regs[IS as usize] |= 1 << line;
    }

    /// Clears a serviced interrupt line in IS.
    pub const fn clear_is_bit(&mut self, line: u8) {
        self.regs[IS as usize] &= !(1 << line);
    }

    /// All register values in index order, for tracing.
    #[must_use]
    pub const fn all(&self) -> &[Word; REGISTER_COUNT] {
        &self.regs
    }
}

use crate::loader::LoadError;
use crate::state::Word;

/// Number of addressable memory cells.
pub const MEMORY_SIZE: usize = 256;
/// Address of the interrupt-vector slot for line 0. Slots for lines 0-7
/// occupy the top eight cells of memory.
pub const VECTOR_TABLE_BASE: u8 = (MEMORY_SIZE - 8) as u8;
/// Boot value of the stack pointer: the unsigned equivalent of the
/// original machine's address-wrapping `-12`.
pub const SP_BOOT: Word = (MEMORY_SIZE - 12) as Word;

/// The 256-cell memory image.
///
/// Cells are word-wide so that full register values survive a push/pop
/// round trip; instruction fetch uses only the low byte of a cell.
/// Addresses are 8-bit, so the address space wraps and plain reads and
/// writes never fail.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Memory {
    cells: Box<[Word]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE].into_boxed_slice(),
        }
    }
}

impl Memory {
    /// Reads the cell at `addr`.
    #[must_use]
    pub fn read(&self, addr: u8) -> Word {
        self.cells[usize::from(addr)]
    }

    /// Writes the cell at `addr`.
    pub fn write(&mut self, addr: u8, value: Word) {
        self.cells[usize::from(addr)] = value;
    }

    /// Writes a program image at ascending addresses starting from 0.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ProgramTooLarge`] when the image does not fit.
    pub fn load(&mut self, image: &[u8]) -> Result<(), LoadError> {
        if image.len() > MEMORY_SIZE {
            return Err(LoadError::ProgramTooLarge);
        }
        for (cell, byte) in self.cells.iter_mut().zip(image) {
            *cell = Word::from(*byte);
        }
        Ok(())
    }

    /// Address of the interrupt-vector slot for `line` (0-7).
    #[must_use]
    pub const fn vector_slot(line: u8) -> u8 {
        VECTOR_TABLE_BASE + line
    }
}

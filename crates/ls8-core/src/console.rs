//! Output seam for the machine's print instructions.
//!
//! `PRN` and `PRA` write through a [`Console`] so the core stays
//! embeddable: the CLI wires up stdout, tests capture into a buffer.

use std::io::Write as _;

use crate::state::Word;

/// Output sink consumed by the dispatch loop.
pub trait Console {
    /// Writes the decimal value of a register followed by a newline (`PRN`).
    fn write_decimal(&mut self, value: Word);

    /// Writes a single character with no trailing newline (`PRA`).
    fn write_char(&mut self, ch: char);
}

/// Converts a register value to the character `PRA` prints.
///
/// Values outside the Unicode scalar range fall back to U+FFFD.
#[must_use]
pub fn char_for_word(value: Word) -> char {
    u32::try_from(value)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Console writing to the process's standard output.
///
/// `PRA` output is flushed immediately since it carries no newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn write_decimal(&mut self, value: Word) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{value}");
    }

    fn write_char(&mut self, ch: char) {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "{ch}");
        let _ = stdout.flush();
    }
}

/// Console capturing output for assertions in tests.
#[derive(Debug, Clone, Default)]
pub struct BufferConsole {
    out: String,
}

impl BufferConsole {
    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.out
    }
}

impl Console for BufferConsole {
    fn write_decimal(&mut self, value: Word) {
        self.out.push_str(&value.to_string());
        self.out.push('\n');
    }

    fn write_char(&mut self, ch: char) {
        self.out.push(ch);
    }
}

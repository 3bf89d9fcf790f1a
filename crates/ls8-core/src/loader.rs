//! Program loader for the textual LS-8 format.
//!
//! One instruction byte per line, written as an 8-bit binary literal
//! (`10000010`), optionally followed by whitespace and a comment. Lines
//! starting with `#` and blank lines are skipped. Load errors surface
//! before execution begins; the machine never starts on a malformed image.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::memory::MEMORY_SIZE;

/// Errors surfaced while reading or parsing a program image.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Program file could not be read.
    #[error("cannot read program: {0}")]
    Io(#[from] std::io::Error),
    /// A line's leading token is not an 8-bit binary number.
    #[error("line {line}: malformed instruction byte {text:?}")]
    MalformedLine {
        /// 1-indexed source line number.
        line: usize,
        /// The offending token.
        text: String,
    },
    /// Program image does not fit in machine memory.
    #[error("program exceeds {MEMORY_SIZE} bytes of memory")]
    ProgramTooLarge,
}

/// Parses program text into the byte image the machine executes.
///
/// # Errors
///
/// Returns [`LoadError::MalformedLine`] for a non-binary token and
/// [`LoadError::ProgramTooLarge`] when the image exceeds memory capacity.
pub fn parse_program(source: &str) -> Result<Vec<u8>, LoadError> {
    let mut image = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some(token) = line.split_whitespace().next() else {
            continue;
        };

        let byte = u8::from_str_radix(token, 2).map_err(|_| LoadError::MalformedLine {
            line: index + 1,
            text: token.to_string(),
        })?;

        if image.len() == MEMORY_SIZE {
            return Err(LoadError::ProgramTooLarge);
        }
        image.push(byte);
    }

    Ok(image)
}

/// Reads and parses a program file.
///
/// # Errors
///
/// Returns [`LoadError::Io`] when the file cannot be read, plus every
/// error [`parse_program`] reports.
pub fn load_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    let source = fs::read_to_string(path)?;
    parse_program(&source)
}

//! Loader for `.ls8` program images.
//!
//! Every line holds at most one byte written as a base-2 literal. Anything
//! after a `#` is a comment:
//!
//! ```text
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```
//!
//! Lines that do not hold a byte are skipped, they are never an error.

use std::fs;
use std::path::Path;
use std::str::{FromStr, Lines};

use crate::error::{Error, Result};

use super::{Byte, Memory};

/// Starts a comment that runs until the end of the line
pub const COMMENT_MARKER: char = '#';

/// Yields the bytes of a program image, one per parseable line.
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Lines<'a>,
    line_nr: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for `data`.
    pub fn new(data: &'a str) -> Self {
        Self {
            lines: data.lines(),
            line_nr: 0,
        }
    }

    /// Tries to parse a single line. Returns `None` if the line holds no byte.
    ///
    /// # Examples
    ///
    /// - `10000010 # LDI R0,8`
    /// - `0b00000001`
    fn parse_line(line: &str) -> Option<Byte> {
        let code = match line.find(COMMENT_MARKER) {
            Some(index) => &line[..index],
            None => line,
        };
        let code = code.trim();
        let digits = code.strip_prefix("0b").unwrap_or(code);

        if digits.is_empty() {
            return None;
        }

        Byte::from_str_radix(digits, 2).ok()
    }
}

impl<'a> Iterator for Parser<'a> {
    type Item = Byte;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_nr += 1;

            match Self::parse_line(line) {
                Some(byte) => return Some(byte),
                None if line.trim().is_empty() || line.trim().starts_with(COMMENT_MARKER) => {}
                None => log::debug!("[{}] Skipping line `{}`", self.line_nr, line.trim()),
            }
        }
    }
}

impl<const S: usize> FromStr for Memory<S> {
    type Err = Error;

    /// Places the program image found in `s` at address 0.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::OutOfBounds`] if the program does not fit.
    fn from_str(s: &str) -> Result<Self> {
        let program = Parser::new(s).collect::<Vec<_>>();
        let mut memory = Memory::default();
        memory.write_array(0, &program)?;
        Ok(memory)
    }
}

impl<const S: usize> Memory<S> {
    /// Reads a `.ls8` file and places its program image at address 0.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        data.parse()
    }
}

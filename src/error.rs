use std::error;
use std::fmt;
use std::io;

use crate::memory::{Byte, Word};
use crate::processor::Instruction;

/// Where an out of bounds access happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// A memory address
    Memory(Word),
    /// A register index
    Register(Byte),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Memory(address) => write!(f, "memory has no address `0x{:x}`", address),
            Location::Register(index) => write!(f, "there is no register `r{}`", index),
        }
    }
}

/// Everything that can stop the machine
#[derive(Debug)]
pub enum Error {
    OutOfBounds(Location),
    IllegalInstruction { opcode: Byte, address: Word },
    UnsupportedOperation { instruction: Instruction },
    StackOverflow { stack_pointer: Byte },
    StackUnderflow { stack_pointer: Byte },
    CycleLimitExceeded { limit: u64 },
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfBounds(location) => write!(f, "out of bounds: {}", location),
            Error::IllegalInstruction { opcode, address } => {
                write!(f, "illegal instruction `0x{:02X}` at `0x{:02X}`", opcode, address)
            }
            Error::UnsupportedOperation { instruction } => {
                write!(f, "the ALU does not support `{}`", instruction)
            }
            Error::StackOverflow { stack_pointer } => {
                write!(f, "stack overflow (sp: `0x{:02X}`)", stack_pointer)
            }
            Error::StackUnderflow { stack_pointer } => {
                write!(f, "stack underflow (sp: `0x{:02X}`)", stack_pointer)
            }
            Error::CycleLimitExceeded { limit } => {
                write!(f, "program did not halt within {} cycles", limit)
            }
            Error::Io(err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

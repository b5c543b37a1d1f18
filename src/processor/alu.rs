//! The arithmetic logic unit

use crate::error::{Error, Result};
use crate::memory::Byte;

use super::Instruction;

/// Computes the new value of register A for an arithmetic instruction.
///
/// Results wrap around at 256, overflow is not an error.
///
/// # Errors
///
/// Fails with [`Error::UnsupportedOperation`] for every instruction that is
/// not handled by the ALU.
pub fn apply(instruction: Instruction, a: Byte, b: Byte) -> Result<Byte> {
    match instruction {
        Instruction::ADD => Ok(a.wrapping_add(b)),
        Instruction::MUL => Ok(a.wrapping_mul(b)),
        _ => Err(Error::UnsupportedOperation { instruction }),
    }
}

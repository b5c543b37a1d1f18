use crate::error::{Error, Location, Result};
use crate::memory::Byte;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;

/// Register reserved as stack pointer
pub const SP: Byte = 7;

/// Initial value of the stack pointer. The stack grows downwards from here.
pub const STACK_BASE: Byte = 0xF4;

/// The register file of the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Registers {
    data: [Byte; REGISTER_COUNT],
}

impl Default for Registers {
    /// All registers are zero, except for the stack pointer
    fn default() -> Self {
        let mut data = [0; REGISTER_COUNT];
        data[SP as usize] = STACK_BASE;
        Self { data }
    }
}

impl Registers {
    /// Reads register `index`
    pub fn get(&self, index: Byte) -> Result<Byte> {
        self.data
            .get(index as usize)
            .copied()
            .ok_or(Error::OutOfBounds(Location::Register(index)))
    }

    /// Writes `value` to register `index`
    pub fn set(&mut self, index: Byte, value: Byte) -> Result<()> {
        let register = self
            .data
            .get_mut(index as usize)
            .ok_or(Error::OutOfBounds(Location::Register(index)))?;
        *register = value;
        Ok(())
    }

    pub fn stack_pointer(&self) -> Byte {
        self.data[SP as usize]
    }

    pub fn set_stack_pointer(&mut self, value: Byte) {
        self.data[SP as usize] = value;
    }

    pub fn as_slice(&self) -> &[Byte] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::Result;

    #[test]
    fn test_initial_state() -> Result<()> {
        let registers = Registers::default();

        assert_eq!(registers.as_slice(), &[0, 0, 0, 0, 0, 0, 0, 0xF4]);
        assert_eq!(registers.stack_pointer(), STACK_BASE);

        Ok(())
    }

    #[test]
    fn test_get_set() -> Result<()> {
        let mut registers = Registers::default();
        registers.set(3, 99)?;

        assert_eq!(registers.get(3)?, 99);
        assert_eq!(registers.get(2)?, 0);

        registers.set(SP, 0x10)?;
        assert_eq!(registers.stack_pointer(), 0x10);

        Ok(())
    }

    #[test]
    fn test_out_of_bounds() -> Result<()> {
        let mut registers = Registers::default();

        assert!(matches!(
            registers.get(8),
            Err(Error::OutOfBounds(Location::Register(8)))
        ));
        assert!(matches!(
            registers.set(0xFF, 1),
            Err(Error::OutOfBounds(Location::Register(0xFF)))
        ));
        assert_eq!(registers, Registers::default());

        Ok(())
    }
}

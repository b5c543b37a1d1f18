use crate::error::{Error, Location, Result};

pub mod parse;

pub type Byte = u8; // 1 byte
pub type Word = u16; // 2 bytes

/// Number of cells in the memory of the LS-8
pub const MEMORY_SIZE: usize = 256;

/// Default memory
pub type StdMem = Memory<MEMORY_SIZE>;

/// Emulates memory for use with the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Memory<const S: usize> {
    /// The actual data of the memory
    data: [Byte; S],
}

impl<const S: usize> Default for Memory<S> {
    /// Initializes the memory
    fn default() -> Self {
        Memory { data: [0; S] }
    }
}

impl<const S: usize> Memory<S> {
    /// Reads a byte from the memory
    pub fn read_byte(&self, position: Word) -> Result<Byte> {
        self.data
            .get(position as usize)
            .copied()
            .ok_or(Error::OutOfBounds(Location::Memory(position)))
    }

    /// Writes a byte to the memory
    pub fn write_byte(&mut self, position: Word, value: Byte) -> Result<()> {
        let cell = self
            .data
            .get_mut(position as usize)
            .ok_or(Error::OutOfBounds(Location::Memory(position)))?;
        *cell = value;
        Ok(())
    }

    /// Writes an array of bytes to the memory. Nothing is written if the
    /// block does not fit.
    pub fn write_array(&mut self, position: Word, data: &[Byte]) -> Result<()> {
        let start = position as usize;
        let end = start + data.len();
        if end > S {
            let last = (end - 1).min(Word::MAX as usize) as Word;
            return Err(Error::OutOfBounds(Location::Memory(last)));
        }

        self.data[start..end].copy_from_slice(data);
        Ok(())
    }

    /// Read-only view of the whole memory
    pub fn as_slice(&self) -> &[Byte] {
        &self.data
    }

    /// Logs every row of 16 cells that holds something other than zero
    pub fn dump(&self) {
        for (row, chunk) in self.data.chunks(16).enumerate() {
            if chunk.iter().all(|&byte| byte == 0) {
                continue;
            }

            let bytes = chunk
                .iter()
                .map(|byte| format!("{:02X}", byte))
                .collect::<Vec<_>>()
                .join(" ");
            log::debug!("{:02X}: {}", row * 16, bytes);
        }
    }
}

/// Writes a block of instructions directly into the memory
#[macro_export]
macro_rules! write_instructions {
    ( $mem:ident : $pos:expr => $( $byte:expr ),+ ) => {
        $mem.write_array($pos, &[
            $(
                $byte as $crate::memory::Byte,
            )+
        ])
    };
}

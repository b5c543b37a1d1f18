use std::io::{self, Stdout, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::memory::{Byte, StdMem, Word};
use crate::processor::{Processor, Registers};

/// The whole LS-8: memory, CPU and the output `PRN` writes to
#[derive(Debug)]
pub struct Machine<W: Write = Stdout> {
    processor: Processor,
    memory: StdMem,
    output: W,
    cycle_limit: Option<u64>,
}

impl Default for Machine<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine<Stdout> {
    /// Creates a machine printing to stdout
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl<W: Write> Machine<W> {
    /// Creates a machine printing to `output`
    pub fn with_output(output: W) -> Self {
        Self {
            processor: Processor::new(),
            memory: StdMem::default(),
            output,
            cycle_limit: None,
        }
    }

    /// Makes [`Machine::run`] give up once `limit` instructions have been
    /// executed without halting.
    pub fn with_cycle_limit(mut self, limit: Option<u64>) -> Self {
        self.cycle_limit = limit;
        self
    }

    /// Installs a program image at address 0, clearing the rest of memory
    pub fn load(&mut self, program: &[Byte]) -> Result<()> {
        let mut memory = StdMem::default();
        memory.write_array(0, program)?;
        self.memory = memory;
        log::debug!("Loaded {} bytes", program.len());
        self.memory.dump();

        Ok(())
    }

    /// Installs the program image of a `.ls8` file at address 0
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.memory = StdMem::from_file(path)?;
        self.memory.dump();

        Ok(())
    }

    /// Executes a single instruction
    pub fn step(&mut self) -> Result<()> {
        self.processor.execute(&mut self.memory, &mut self.output)
    }

    /// Executes instructions until `HLT`
    pub fn run(&mut self) -> Result<()> {
        let result = self.processor.execute_until_hlt(
            &mut self.memory,
            &mut self.output,
            self.cycle_limit,
        );
        let flushed = self.output.flush();
        result.and(flushed.map_err(Error::from))
    }

    pub fn is_halted(&self) -> bool {
        self.processor.halted
    }

    pub fn pc(&self) -> Word {
        self.processor.pc
    }

    pub fn cycles(&self) -> u64 {
        self.processor.cycles
    }

    pub fn registers(&self) -> &Registers {
        &self.processor.registers
    }

    pub fn memory(&self) -> &StdMem {
        &self.memory
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use crate::processor::registers::STACK_BASE;

    use super::*;
    use color_eyre::eyre::Result;

    fn run(program: &[Byte]) -> Result<String> {
        let mut machine = Machine::with_output(Vec::new());
        machine.load(program)?;
        machine.run()?;
        assert!(machine.is_halted());

        Ok(String::from_utf8(machine.into_output())?)
    }

    #[test]
    fn test_add_and_print() -> Result<()> {
        let out = run(&[0x82, 0, 8, 0x82, 1, 9, 0xA0, 0, 1, 0x47, 0, 0x01])?;
        assert_eq!(out, "17\n");

        Ok(())
    }

    #[test]
    fn test_add_wraps() -> Result<()> {
        let out = run(&[0x82, 0, 200, 0x82, 1, 100, 0xA0, 0, 1, 0x47, 0, 0x01])?;
        assert_eq!(out, "44\n");

        Ok(())
    }

    #[test]
    fn test_deterministic() -> Result<()> {
        let program = [0x82, 0, 3, 0x45, 0, 0xA2, 0, 0, 0x46, 1, 0x47, 1, 0x47, 0, 0x01];

        let mut first = Machine::with_output(Vec::new());
        first.load(&program)?;
        first.run()?;

        let mut second = Machine::with_output(Vec::new());
        second.load(&program)?;
        second.run()?;

        assert_eq!(first.registers(), second.registers());
        assert_eq!(first.memory(), second.memory());
        assert_eq!(first.output(), second.output());
        assert_eq!(first.output().as_slice(), b"3\n9\n");
        assert_eq!(first.registers().stack_pointer(), STACK_BASE);

        Ok(())
    }

    #[test]
    fn test_step() -> Result<()> {
        let mut machine = Machine::with_output(Vec::new());
        machine.load(&[0x82, 0, 8, 0x01])?;
        assert_eq!(&machine.memory().as_slice()[..5], &[0x82, 0, 8, 0x01, 0]);

        machine.step()?;
        assert_eq!(machine.pc(), 3);
        assert_eq!(machine.registers().get(0)?, 8);
        assert!(!machine.is_halted());

        machine.step()?;
        assert!(machine.is_halted());
        assert_eq!(machine.cycles(), 2);

        Ok(())
    }

    #[test]
    fn test_illegal_instruction() -> Result<()> {
        let mut machine = Machine::with_output(Vec::new());
        machine.load(&[0x82, 0, 8, 0x47, 0, 0x02])?;

        let result = machine.run();

        assert!(matches!(
            result,
            Err(Error::IllegalInstruction {
                opcode: 0x02,
                address: 5
            })
        ));
        // output written before the fault is kept
        assert_eq!(machine.output().as_slice(), b"8\n");

        Ok(())
    }

    #[test]
    fn test_empty_memory_is_illegal() -> Result<()> {
        let mut machine = Machine::with_output(Vec::new());

        assert!(matches!(
            machine.run(),
            Err(Error::IllegalInstruction {
                opcode: 0x00,
                address: 0
            })
        ));

        Ok(())
    }

    #[test]
    fn test_cycle_limit() -> Result<()> {
        // r0 points at the CALL itself, it never returns
        let program = [0x82, 0, 3, 0x50, 0];

        let mut machine = Machine::with_output(Vec::new()).with_cycle_limit(Some(100));
        machine.load(&program)?;

        assert!(matches!(
            machine.run(),
            Err(Error::CycleLimitExceeded { limit: 100 })
        ));
        assert_eq!(machine.cycles(), 100);
        assert_eq!(machine.registers().stack_pointer(), STACK_BASE - 99);

        Ok(())
    }

    #[test]
    fn test_load_replaces_memory() -> Result<()> {
        let mut machine = Machine::with_output(Vec::new());
        machine.load(&[0x82, 0, 8, 0x82, 1, 9, 0x01])?;
        machine.load(&[0x82, 0, 8, 0x01])?;

        assert_eq!(&machine.memory().as_slice()[..7], &[0x82, 0, 8, 0x01, 0, 0, 0]);

        Ok(())
    }

    /// Accepts writes, fails every flush
    #[derive(Debug, Default)]
    struct FailingFlush(Vec<u8>);

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "flush failed"))
        }
    }

    #[test]
    fn test_run_error_wins_over_flush_error() -> Result<()> {
        let mut machine = Machine::with_output(FailingFlush::default());
        machine.load(&[0x82, 0, 8, 0x47, 0, 0x02])?;

        assert!(matches!(
            machine.run(),
            Err(Error::IllegalInstruction {
                opcode: 0x02,
                address: 5
            })
        ));

        let mut machine = Machine::with_output(FailingFlush::default());
        machine.load(&[0x01])?;

        assert!(matches!(machine.run(), Err(Error::Io(_))));

        Ok(())
    }

    #[test]
    fn test_load_too_large() -> Result<()> {
        let mut machine = Machine::with_output(Vec::new());

        assert!(matches!(
            machine.load(&[0; 257]),
            Err(Error::OutOfBounds(_))
        ));

        Ok(())
    }
}

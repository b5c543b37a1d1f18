use std::convert::TryFrom;
use std::io::Write;

use crate::error::{Error, Location, Result};
use crate::memory::{Byte, Memory, Word};
use log::*;
use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;

pub mod alu;
pub mod registers;

pub use registers::Registers;

/// Emulates the LS-8 CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Processor {
    /// Program counter
    pub pc: Word,
    /// General purpose registers, r7 is the stack pointer
    pub registers: Registers,
    /// Set once `HLT` has been executed
    pub halted: bool,
    /// Number of instructions executed so far
    pub cycles: u64,
}

/// What happens to the program counter after an instruction has executed
enum Next {
    Advance,
    Jump(Word),
    Halt,
}

impl Processor {
    /// Initializes a new CPU, starting at address 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the stack pointer down by one and returns the new top
    fn grow_stack(&mut self) -> Result<Byte> {
        let sp = self.registers.stack_pointer();
        let top = sp
            .checked_sub(1)
            .ok_or(Error::StackOverflow { stack_pointer: sp })?;
        self.registers.set_stack_pointer(top);

        Ok(top)
    }

    /// Pushes `value` onto the stack
    pub fn push<const S: usize>(&mut self, memory: &mut Memory<S>, value: Byte) -> Result<()> {
        let top = self.grow_stack()?;
        memory.write_byte(top as Word, value)
    }

    /// Pushes the content of `register` onto the stack. The register is read
    /// after the stack pointer moved, so pushing r7 stores the new top.
    pub fn push_register<const S: usize>(
        &mut self,
        memory: &mut Memory<S>,
        register: Byte,
    ) -> Result<Byte> {
        self.registers.get(register)?;
        let top = self.grow_stack()?;
        let value = self.registers.get(register)?;
        memory.write_byte(top as Word, value)?;

        Ok(value)
    }

    /// Pops the top of the stack
    pub fn pop<const S: usize>(&mut self, memory: &mut Memory<S>) -> Result<Byte> {
        let sp = self.registers.stack_pointer();
        let next = sp
            .checked_add(1)
            .ok_or(Error::StackUnderflow { stack_pointer: sp })?;

        let value = memory.read_byte(sp as Word)?;
        self.registers.set_stack_pointer(next);

        Ok(value)
    }

    /// Executes a single decoded instruction and moves the program counter
    pub fn execute_op<const S: usize, W: Write>(
        &mut self,
        op: Op,
        memory: &mut Memory<S>,
        out: &mut W,
    ) -> Result<()> {
        let next = match op {
            Op::Halt => {
                debug!("HLT");

                Next::Halt
            }
            Op::LoadImmediate { register, value } => {
                self.registers.set(register, value)?;

                debug!("LDI r{} {}", register, value);
                Next::Advance
            }
            Op::Print { register } => {
                let value = self.registers.get(register)?;
                writeln!(out, "{}", value)?;

                debug!("PRN r{}: {}", register, value);
                Next::Advance
            }
            Op::Arithmetic { instruction, a, b } => {
                let lhs = self.registers.get(a)?;
                let rhs = self.registers.get(b)?;
                let result = alu::apply(instruction, lhs, rhs)?;
                self.registers.set(a, result)?;

                debug!("{} r{} r{}: {} {} = {}", instruction, a, b, lhs, rhs, result);
                Next::Advance
            }
            Op::Push { register } => {
                let value = self.push_register(memory, register)?;

                debug!("PUSH r{}: {}", register, value);
                Next::Advance
            }
            Op::Pop { register } => {
                // validate the register before touching the stack
                self.registers.get(register)?;
                let value = self.pop(memory)?;
                self.registers.set(register, value)?;

                debug!("POP r{}: {}", register, value);
                Next::Advance
            }
            Op::Call { register } => {
                self.registers.get(register)?;
                let return_address = self.pc.saturating_add(op.width());
                let return_address = Byte::try_from(return_address)
                    .map_err(|_| Error::OutOfBounds(Location::Memory(return_address)))?;
                self.push(memory, return_address)?;
                // read after the push, `CALL r7` jumps to the new top
                let target = self.registers.get(register)?;

                debug!("CALL r{}: 0x{:02X}", register, target);
                Next::Jump(target as Word)
            }
            Op::Return => {
                let address = self.pop(memory)?;

                debug!("RET 0x{:02X}", address);
                Next::Jump(address as Word)
            }
        };

        self.cycles += 1;

        match next {
            Next::Advance => {
                let pc = self.pc.saturating_add(op.width());
                if pc as usize >= S {
                    return Err(Error::OutOfBounds(Location::Memory(pc)));
                }
                self.pc = pc;
            }
            Next::Jump(address) => self.pc = address,
            Next::Halt => self.halted = true,
        }

        Ok(())
    }

    /// Runs one execution step
    pub fn execute<const S: usize, W: Write>(
        &mut self,
        memory: &mut Memory<S>,
        out: &mut W,
    ) -> Result<()> {
        if log_enabled!(Level::Trace) {
            trace!("{}", self.trace(memory));
        }

        let op = Op::decode(memory, self.pc)?;
        self.execute_op(op, memory, out)
    }

    /// Run program until `HLT` is executed, or until `limit` instructions
    /// have been executed without halting.
    pub fn execute_until_hlt<const S: usize, W: Write>(
        &mut self,
        memory: &mut Memory<S>,
        out: &mut W,
        limit: Option<u64>,
    ) -> Result<()> {
        while !self.halted {
            if let Some(limit) = limit {
                if self.cycles >= limit {
                    return Err(Error::CycleLimitExceeded { limit });
                }
            }

            self.execute(memory, out)?;
        }

        info!("Program halted after {} cycles", self.cycles);

        Ok(())
    }

    /// Formats the state of the CPU: the program counter, the next three
    /// bytes in memory and all registers.
    pub fn trace<const S: usize>(&self, memory: &Memory<S>) -> String {
        let peek = |offset: Word| match memory.read_byte(self.pc.saturating_add(offset)) {
            Ok(byte) => format!("{:02X}", byte),
            Err(_) => "--".to_string(),
        };

        let mut line = format!(
            "TRACE: {:02X} | {} {} {} |",
            self.pc,
            peek(0),
            peek(1),
            peek(2)
        );
        for register in self.registers.as_slice() {
            line.push_str(&format!(" {:02X}", register));
        }

        line
    }
}

/// An instruction together with its operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Halt,
    LoadImmediate {
        register: Byte,
        value: Byte,
    },
    Print {
        register: Byte,
    },
    /// Evaluated by the [ALU](alu)
    Arithmetic {
        instruction: Instruction,
        a: Byte,
        b: Byte,
    },
    Push {
        register: Byte,
    },
    Pop {
        register: Byte,
    },
    Call {
        register: Byte,
    },
    Return,
}

impl Op {
    /// Decodes the instruction located at `address`
    pub fn decode<const S: usize>(memory: &Memory<S>, address: Word) -> Result<Self> {
        let opcode = memory.read_byte(address)?;
        let instruction = Instruction::try_from(opcode)
            .map_err(|_| Error::IllegalInstruction { opcode, address })?;

        let mut operands = [0; 2];
        for (offset, operand) in operands
            .iter_mut()
            .take(instruction.operand_count())
            .enumerate()
        {
            *operand = memory.read_byte(address.saturating_add(offset as Word + 1))?;
        }
        let [a, b] = operands;

        let op = match instruction {
            Instruction::HLT => Op::Halt,
            Instruction::LDI => Op::LoadImmediate {
                register: a,
                value: b,
            },
            Instruction::PRN => Op::Print { register: a },
            Instruction::ADD | Instruction::MUL => Op::Arithmetic { instruction, a, b },
            Instruction::PUSH => Op::Push { register: a },
            Instruction::POP => Op::Pop { register: a },
            Instruction::CALL => Op::Call { register: a },
            Instruction::RET => Op::Return,
        };

        Ok(op)
    }

    pub fn instruction(&self) -> Instruction {
        match self {
            Op::Halt => Instruction::HLT,
            Op::LoadImmediate { .. } => Instruction::LDI,
            Op::Print { .. } => Instruction::PRN,
            Op::Arithmetic { instruction, .. } => *instruction,
            Op::Push { .. } => Instruction::PUSH,
            Op::Pop { .. } => Instruction::POP,
            Op::Call { .. } => Instruction::CALL,
            Op::Return => Instruction::RET,
        }
    }

    /// Number of bytes the instruction occupies in memory
    pub fn width(&self) -> Word {
        self.instruction().width()
    }
}

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal ( $operands:literal ) , )+ ) => {
        /// Defines the instructions and how many operand bytes follow each
        /// of them
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Instruction {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Instruction {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name) , )+
                }
            }

            /// Number of operand bytes following the opcode
            pub fn operand_count(&self) -> usize {
                match self {
                    $( Self::$name => $operands , )+
                }
            }

            /// Number of bytes including the opcode
            pub fn width(&self) -> Word {
                1 + self.operand_count() as Word
            }
        }

        impl ::std::fmt::Display for Instruction {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $( Self::$name => f.write_str(stringify!($name)) , )+
                }
            }
        }
    }
}

instructions! {
    /// Halt the CPU
    HLT = 0b0000_0001 (0),
    /// Set a register to an immediate value
    /// @param register
    /// @param value
    LDI = 0b1000_0010 (2),
    /// Print the decimal value stored in a register
    /// @param register
    PRN = 0b0100_0111 (1),
    /// Multiply two registers and store the result in the first one
    /// @param register a
    /// @param register b
    MUL = 0b1010_0010 (2),
    /// Add two registers and store the result in the first one
    /// @param register a
    /// @param register b
    ADD = 0b1010_0000 (2),
    /// Push a register onto the stack
    /// @param register
    PUSH = 0b0100_0101 (1),
    /// Pop the top of the stack into a register
    /// @param register
    POP = 0b0100_0110 (1),
    /// Push the return address and jump to the address held in a register
    /// @param register
    CALL = 0b0101_0000 (1),
    /// Pop the return address into the program counter
    RET = 0b0001_0001 (0),
}

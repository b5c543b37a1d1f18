//! An emulator for the LS-8, an 8-bit CPU with 256 bytes of memory, eight
//! registers and a descending stack.

pub mod error;
pub mod machine;
pub mod memory;
pub mod processor;

pub use error::{Error, Result};
pub use machine::Machine;

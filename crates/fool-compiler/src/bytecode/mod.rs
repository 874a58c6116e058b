//! Stack machine code.
//!
//! - [`Instruction`] - The instruction set of the target machine
//! - [`CodeChunk`] - An ordered instruction stream with its textual rendering

mod chunk;
mod instruction;

pub use chunk::CodeChunk;
pub use instruction::{Instruction, Operand};

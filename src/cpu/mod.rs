//! The Intcode machine.
//!
//! This module implements the complete engine:
//! - unbounded sparse memory of 64-bit words
//! - 2 registers: pc and relative base
//! - 10-opcode instruction set with position, immediate and relative operands

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

pub use memory::{Memory, MemoryError, Word};
pub use registers::Registers;
pub use decode::{decode, Instruction, Opcode, ParamMode, DecodeError};
pub use execute::{
    CpuError, InputMode, Machine, MachineConfig, MachineState, RunOutcome, StepOutcome,
};

//! # Intcode VM
//!
//! A small stored-program virtual machine with a sparse 64-bit memory,
//! three addressing modes, and a run/suspend/resume execution contract.
//!
//! A machine runs until it halts or until an input instruction finds its
//! queue empty; in the second case it suspends and the next `run` call
//! resumes at the same instruction with a fresh input batch.

pub mod cpu;
pub mod program;
pub mod network;
pub mod harness;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{
    CpuError, InputMode, Instruction, Machine, MachineConfig, MachineState, Memory, Opcode,
    ParamMode, Registers, RunOutcome, StepOutcome, Word,
};
pub use program::{disassemble, format_program, load_program, parse_program, ProgramError};
pub use network::{AmplifierNetwork, NetworkError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;

//! TUI debugger for Intcode programs.
//!
//! Provides an interactive terminal-based debugger with:
//! - Disassembly around the program counter
//! - Registers, machine state and output panels
//! - Step/run/breakpoint controls and input entry

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};

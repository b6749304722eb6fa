//! Program text format and disassembly.
//!
//! This module provides:
//! - A loader for the comma-separated program format
//! - A disassembler (memory words → readable text)

pub mod parse;
pub mod disasm;

pub use parse::{format_program, load_program, parse_program, ProgramError};
pub use disasm::{disassemble, disassemble_at};

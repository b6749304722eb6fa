//! Instruction decoder for Intcode.
//!
//! An instruction word packs the opcode in its two lowest decimal digits
//! and one addressing-mode digit per parameter above that:
//!
//! ```text
//!   ABCDE
//!   |||``- opcode (DE)
//!   ||`--- mode of parameter 0 (C)
//!   |`---- mode of parameter 1 (B)
//!   `----- mode of parameter 2 (A)
//! ```

use crate::cpu::memory::{to_address, MemoryError, Word};
use crate::cpu::registers::Registers;
use serde::Serialize;
use thiserror::Error;

/// Parameter addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ParamMode {
    /// Operand is an address (mode 0).
    #[default]
    Position,
    /// Operand is the value itself (mode 1).
    Immediate,
    /// Operand is an address offset by the relative base (mode 2).
    Relative,
}

impl ParamMode {
    /// Create from a mode digit.
    pub fn from_digit(digit: Word) -> Option<Self> {
        match digit {
            0 => Some(ParamMode::Position),
            1 => Some(ParamMode::Immediate),
            2 => Some(ParamMode::Relative),
            _ => None,
        }
    }

    /// Convert to the mode digit.
    pub fn to_digit(self) -> Word {
        match self {
            ParamMode::Position => 0,
            ParamMode::Immediate => 1,
            ParamMode::Relative => 2,
        }
    }

    /// Resolve a raw operand word into what it refers to.
    ///
    /// Resolution reads nothing from memory, so resolving the same operand
    /// twice without an intervening write gives the same target.
    pub fn resolve(self, raw: Word, regs: &Registers) -> Result<Target, MemoryError> {
        match self {
            ParamMode::Position => to_address(raw).map(Target::Address),
            ParamMode::Immediate => Ok(Target::Value(raw)),
            ParamMode::Relative => {
                let effective = regs.relative_address(raw).ok_or(MemoryError::AddressOverflow {
                    raw,
                    base: regs.relative_base,
                })?;
                to_address(effective).map(Target::Address)
            }
        }
    }
}

/// A resolved operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A memory cell, readable and writable.
    Address(u64),
    /// A literal value; reads yield it, writes are rejected.
    Value(Word),
}

/// Operation selector (the two low digits of an instruction word).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Opcode {
    /// dst := a + b
    Add,
    /// dst := a * b
    Mul,
    /// dst := next input
    Input,
    /// emit a
    Output,
    /// if a != 0 then pc := b
    JumpIfTrue,
    /// if a == 0 then pc := b
    JumpIfFalse,
    /// dst := (a < b)
    LessThan,
    /// dst := (a == b)
    Equals,
    /// relative base += a
    AdjustBase,
    /// Stop the machine
    Halt,
}

impl Opcode {
    const ADD: Word = 1;
    const MUL: Word = 2;
    const IN: Word = 3;
    const OUT: Word = 4;
    const JNZ: Word = 5;
    const JZ: Word = 6;
    const LT: Word = 7;
    const EQ: Word = 8;
    const ARB: Word = 9;
    const HLT: Word = 99;

    /// Look up an opcode by its numeric code.
    pub fn from_code(code: Word) -> Option<Self> {
        let op = match code {
            Self::ADD => Opcode::Add,
            Self::MUL => Opcode::Mul,
            Self::IN => Opcode::Input,
            Self::OUT => Opcode::Output,
            Self::JNZ => Opcode::JumpIfTrue,
            Self::JZ => Opcode::JumpIfFalse,
            Self::LT => Opcode::LessThan,
            Self::EQ => Opcode::Equals,
            Self::ARB => Opcode::AdjustBase,
            Self::HLT => Opcode::Halt,
            _ => return None,
        };
        Some(op)
    }

    /// Numeric code of this opcode.
    pub fn code(self) -> Word {
        match self {
            Opcode::Add => Self::ADD,
            Opcode::Mul => Self::MUL,
            Opcode::Input => Self::IN,
            Opcode::Output => Self::OUT,
            Opcode::JumpIfTrue => Self::JNZ,
            Opcode::JumpIfFalse => Self::JZ,
            Opcode::LessThan => Self::LT,
            Opcode::Equals => Self::EQ,
            Opcode::AdjustBase => Self::ARB,
            Opcode::Halt => Self::HLT,
        }
    }

    /// Number of parameters the instruction takes.
    pub fn params(self) -> usize {
        match self {
            Opcode::Add | Opcode::Mul | Opcode::LessThan | Opcode::Equals => 3,
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => 2,
            Opcode::Input | Opcode::Output | Opcode::AdjustBase => 1,
            Opcode::Halt => 0,
        }
    }

    /// Index of the parameter this instruction stores into, if any.
    pub fn destination(self) -> Option<usize> {
        match self {
            Opcode::Add | Opcode::Mul | Opcode::LessThan | Opcode::Equals => Some(2),
            Opcode::Input => Some(0),
            _ => None,
        }
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::Input => "IN",
            Opcode::Output => "OUT",
            Opcode::JumpIfTrue => "JNZ",
            Opcode::JumpIfFalse => "JZ",
            Opcode::LessThan => "LT",
            Opcode::Equals => "EQ",
            Opcode::AdjustBase => "ARB",
            Opcode::Halt => "HLT",
        }
    }
}

/// A decoded instruction: opcode plus the mode of each parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub modes: [ParamMode; 3],
}

impl Instruction {
    /// Instruction with all parameters in position mode.
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            modes: [ParamMode::Position; 3],
        }
    }

    /// Builder: set the mode of parameter `index`.
    pub fn with_mode(mut self, index: usize, mode: ParamMode) -> Self {
        self.modes[index] = mode;
        self
    }

    /// Total width in words, opcode included.
    pub fn width(&self) -> u64 {
        self.opcode.params() as u64 + 1
    }
}

/// Raw mode digits of an instruction word, parameter 0 first.
pub fn mode_digits(word: Word) -> [Word; 3] {
    [
        (word / 100) % 10,
        (word / 1_000) % 10,
        (word / 10_000) % 10,
    ]
}

/// Decode the instruction word fetched from `addr`.
pub fn decode(word: Word, addr: u64) -> Result<Instruction, DecodeError> {
    let opcode = Opcode::from_code(word % 100)
        .ok_or(DecodeError::InvalidOpcode { word, addr })?;

    let mut modes = [ParamMode::Position; 3];
    for (slot, digit) in modes.iter_mut().zip(mode_digits(word)) {
        *slot = ParamMode::from_digit(digit)
            .ok_or(DecodeError::InvalidMode { mode: digit, word, addr })?;
    }

    Ok(Instruction { opcode, modes })
}

/// Encode an instruction back to a word.
pub fn encode(instr: &Instruction) -> Word {
    instr.opcode.code()
        + instr.modes[0].to_digit() * 100
        + instr.modes[1].to_digit() * 1_000
        + instr.modes[2].to_digit() * 10_000
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode in word {word} at address {addr}")]
    InvalidOpcode { word: Word, addr: u64 },

    #[error("invalid addressing mode {mode} in word {word} at address {addr}")]
    InvalidMode { mode: Word, word: Word, addr: u64 },
}

//! Intcode registers.
//!
//! The machine has two registers:
//! - pc: address of the next instruction
//! - relative base: offset added to relative-mode operands

use crate::cpu::memory::{to_address, MemoryError, Word};
use serde::Serialize;

/// The register file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Registers {
    /// Program counter.
    pub pc: u64,

    /// Relative base for mode-2 operands.
    pub relative_base: Word,
}

impl Registers {
    /// Create a new register file with both registers at zero.
    pub fn new() -> Self {
        Self {
            pc: 0,
            relative_base: 0,
        }
    }

    /// Reset both registers to zero.
    pub fn reset(&mut self) {
        self.pc = 0;
        self.relative_base = 0;
    }

    /// Advance the program counter past an instruction of `len` words.
    /// Returns the old value.
    pub fn advance_pc(&mut self, len: u64) -> u64 {
        let old = self.pc;
        self.pc += len;
        old
    }

    /// Set the program counter to a target produced by a jump operand.
    pub fn jump(&mut self, target: Word) -> Result<(), MemoryError> {
        self.pc = to_address(target)?;
        Ok(())
    }

    /// Address of operand slot `index` (0-based) of the current instruction.
    #[inline]
    pub fn operand_address(&self, index: usize) -> u64 {
        self.pc + 1 + index as u64
    }

    /// Compute the effective address of a relative-mode operand.
    /// Returns `None` on overflow.
    pub fn relative_address(&self, raw: Word) -> Option<Word> {
        raw.checked_add(self.relative_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_pc() {
        let mut regs = Registers::new();
        regs.pc = 10;

        let old = regs.advance_pc(4);
        assert_eq!(old, 10);
        assert_eq!(regs.pc, 14);
    }

    #[test]
    fn test_jump() {
        let mut regs = Registers::new();
        regs.jump(99).unwrap();
        assert_eq!(regs.pc, 99);

        assert_eq!(regs.jump(-1), Err(MemoryError::NegativeAddress(-1)));
        assert_eq!(regs.pc, 99);
    }

    #[test]
    fn test_relative_address() {
        let mut regs = Registers::new();
        regs.relative_base = 2000;

        assert_eq!(regs.relative_address(-7), Some(1993));
        regs.relative_base = Word::MAX;
        assert_eq!(regs.relative_address(1), None);
    }

    #[test]
    fn test_operand_address() {
        let mut regs = Registers::new();
        regs.pc = 8;
        assert_eq!(regs.operand_address(0), 9);
        assert_eq!(regs.operand_address(2), 11);
    }
}

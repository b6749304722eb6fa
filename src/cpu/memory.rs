//! Intcode memory subsystem.
//!
//! Memory is an unbounded, sparse address space of signed 64-bit words.
//! Every address reads as zero until it is written, and writes may land
//! arbitrarily far beyond the loaded program.

use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// A machine word.
pub type Word = i64;

/// Largest dense image `to_vec` will build.
pub const MAX_IMAGE_CELLS: u64 = 1 << 24;

/// Sparse, zero-initialized memory.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct Memory {
    cells: HashMap<u64, Word>,
}

impl Memory {
    /// Create an empty memory (every address reads as zero).
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
        }
    }

    /// Create a memory with `program` loaded at addresses `0..n`.
    pub fn from_program(program: &[Word]) -> Self {
        let mut mem = Self::new();
        mem.load_program(0, program);
        mem
    }

    /// Read a cell. Unset addresses read as zero.
    #[inline]
    pub fn read(&self, addr: u64) -> Word {
        self.cells.get(&addr).copied().unwrap_or(0)
    }

    /// Write a cell, creating it if needed.
    #[inline]
    pub fn write(&mut self, addr: u64, value: Word) {
        self.cells.insert(addr, value);
    }

    /// Read using a signed address, as produced by position and relative
    /// operands.
    pub fn read_signed(&self, addr: Word) -> Result<Word, MemoryError> {
        Ok(self.read(to_address(addr)?))
    }

    /// Write using a signed address.
    pub fn write_signed(&mut self, addr: Word, value: Word) -> Result<(), MemoryError> {
        self.write(to_address(addr)?, value);
        Ok(())
    }

    /// Load a program starting at the given address.
    pub fn load_program(&mut self, start_addr: u64, program: &[Word]) {
        for (i, &word) in program.iter().enumerate() {
            self.cells.insert(start_addr + i as u64, word);
        }
    }

    /// Highest address that has ever been written, if any.
    pub fn highest_address(&self) -> Option<u64> {
        self.cells.keys().copied().max()
    }

    /// Number of addresses that have been written.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Dense image of addresses `0..=highest_address`.
    ///
    /// Fails with `ImageTooLarge` when the highest written address is at or
    /// past [`MAX_IMAGE_CELLS`].
    pub fn to_vec(&self) -> Result<Vec<Word>, MemoryError> {
        let Some(highest) = self.highest_address() else {
            return Ok(Vec::new());
        };
        if highest >= MAX_IMAGE_CELLS {
            return Err(MemoryError::ImageTooLarge { highest });
        }
        let len = usize::try_from(highest + 1).map_err(|_| MemoryError::ImageTooLarge { highest })?;

        let mut image = vec![0; len];
        for (&addr, &value) in &self.cells {
            // every addr <= highest
            if let Ok(idx) = usize::try_from(addr) {
                image[idx] = value;
            }
        }
        Ok(image)
    }

    /// Non-zero cells at or beyond `start`, in address order.
    pub fn nonzero_from(&self, start: u64) -> Vec<(u64, Word)> {
        let mut cells: Vec<(u64, Word)> = self
            .cells
            .iter()
            .filter(|&(&addr, &value)| addr >= start && value != 0)
            .map(|(&addr, &value)| (addr, value))
            .collect();
        cells.sort_unstable();
        cells
    }

    /// True if addresses `0..expected.len()` hold `expected` and every
    /// address past that reads as zero.
    ///
    /// Works on the sparse map, so a write far beyond the program costs
    /// nothing extra.
    pub fn matches_image(&self, expected: &[Word]) -> bool {
        let prefix_ok = expected
            .iter()
            .enumerate()
            .all(|(i, &word)| self.read(i as u64) == word);
        let end = expected.len() as u64;
        prefix_ok && self.cells.iter().all(|(&addr, &value)| addr < end || value == 0)
    }

    /// Dump `count` cells starting at `start` (for debugging).
    pub fn dump(&self, start: u64, count: usize) -> Vec<(u64, Word)> {
        (start..start.saturating_add(count as u64))
            .map(|addr| (addr, self.read(addr)))
            .collect()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.values().filter(|v| **v != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("written_cells", &self.cells.len())
            .field("highest_address", &self.highest_address())
            .finish()
    }
}

/// Convert a signed effective address into a memory address.
pub(crate) fn to_address(addr: Word) -> Result<u64, MemoryError> {
    u64::try_from(addr).map_err(|_| MemoryError::NegativeAddress(addr))
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Effective address is below zero.
    #[error("memory address {0} is negative")]
    NegativeAddress(Word),

    /// Relative operand plus base does not fit in a word.
    #[error("relative address {raw} + base {base} overflows")]
    AddressOverflow { raw: Word, base: Word },

    /// A dense image would need more than `MAX_IMAGE_CELLS` cells.
    #[error("memory image up to address {highest} is too large to build")]
    ImageTooLarge { highest: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();

        mem.write(10, 42);
        assert_eq!(mem.read(10), 42);
    }

    #[test]
    fn test_unset_reads_zero() {
        let mem = Memory::from_program(&[1, 2, 3]);
        assert_eq!(mem.read(3), 0);
        assert_eq!(mem.read(1_000_000_000), 0);
    }

    #[test]
    fn test_write_far_beyond_program() {
        let mut mem = Memory::from_program(&[99]);
        mem.write(5_000_000, -7);

        assert_eq!(mem.read(5_000_000), -7);
        assert_eq!(mem.highest_address(), Some(5_000_000));
        assert_eq!(mem.len(), 2);
    }

    #[test]
    fn test_signed_bounds() {
        let mut mem = Memory::new();

        assert_eq!(mem.read_signed(0), Ok(0));
        assert_eq!(mem.read_signed(-1), Err(MemoryError::NegativeAddress(-1)));
        assert_eq!(mem.write_signed(-3, 1), Err(MemoryError::NegativeAddress(-3)));
        assert!(mem.is_empty());
    }

    #[test]
    fn test_load_program_and_image() {
        let mut mem = Memory::new();
        mem.load_program(2, &[7, 8]);

        assert_eq!(mem.to_vec().unwrap(), vec![0, 0, 7, 8]);
        assert_eq!(mem.dump(1, 3), vec![(1, 0), (2, 7), (3, 8)]);
    }

    #[test]
    fn test_empty_image() {
        assert!(Memory::new().to_vec().unwrap().is_empty());
    }

    #[test]
    fn test_far_write_image_is_refused() {
        let mut mem = Memory::from_program(&[99]);
        mem.write(1 << 62, 2);

        assert_eq!(mem.to_vec(), Err(MemoryError::ImageTooLarge { highest: 1 << 62 }));
        assert_eq!(mem.nonzero_from(1), vec![(1 << 62, 2)]);
    }

    #[test]
    fn test_matches_image_sparse() {
        let mut mem = Memory::from_program(&[1, 2]);
        assert!(mem.matches_image(&[1, 2]));
        assert!(mem.matches_image(&[1, 2, 0, 0]));
        assert!(!mem.matches_image(&[1, 3]));
        assert!(!mem.matches_image(&[1]));

        mem.write(1 << 62, 0);
        assert!(mem.matches_image(&[1, 2]));

        mem.write(1 << 62, 5);
        assert!(!mem.matches_image(&[1, 2]));
    }

    proptest! {
        /// Once written, a cell keeps its value until overwritten.
        #[test]
        fn prop_write_persists(
            addr in 0u64..1_000_000,
            value in any::<i64>(),
            other in 0u64..1_000_000,
            other_value in any::<i64>(),
        ) {
            prop_assume!(addr != other);
            let mut mem = Memory::new();
            mem.write(addr, value);
            mem.write(other, other_value);

            prop_assert_eq!(mem.read(addr), value);
            prop_assert_eq!(mem.read(other), other_value);
        }

        /// Writes never shrink memory.
        #[test]
        fn prop_memory_never_shrinks(addrs in proptest::collection::vec(0u64..10_000, 1..50)) {
            let mut mem = Memory::new();
            let mut last = 0;
            for addr in addrs {
                mem.write(addr, 1);
                prop_assert!(mem.len() >= last);
                last = mem.len();
            }
        }
    }
}

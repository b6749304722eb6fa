//! Disassembler for Intcode programs.
//!
//! Operand syntax:
//! - `[12]`     position mode
//! - `#12`      immediate mode
//! - `[rb+12]`  relative mode

use crate::cpu::{decode, Memory, ParamMode, Word};

/// Disassemble the instruction at `addr`.
///
/// Returns the text and the instruction width in words. Words that do not
/// decode are shown as `DAT` with width 1.
pub fn disassemble_at(mem: &Memory, addr: u64) -> (String, u64) {
    let word = mem.read(addr);
    let Ok(instr) = decode(word, addr) else {
        return (format!("DAT {}", word), 1);
    };

    let operands: Vec<String> = (0..instr.opcode.params())
        .map(|i| format_operand(instr.modes[i], mem.read(addr + 1 + i as u64)))
        .collect();

    let text = if operands.is_empty() {
        instr.opcode.mnemonic().to_string()
    } else {
        format!("{} {}", instr.opcode.mnemonic(), operands.join(", "))
    };

    (text, instr.width())
}

/// Disassemble a whole program by linear sweep.
pub fn disassemble(words: &[Word]) -> String {
    let mem = Memory::from_program(words);
    let end = words.len() as u64;

    let mut output = String::new();
    output.push_str("; Intcode Disassembly\n");
    output.push_str("; -------------------\n\n");

    let mut addr = 0;
    while addr < end {
        let (line, width) = disassemble_at(&mem, addr);
        let raw: Vec<String> = (addr..(addr + width).min(end))
            .map(|a| mem.read(a).to_string())
            .collect();
        output.push_str(&format!("{:04}: {:<28} ; {}\n", addr, line, raw.join(",")));
        addr += width;
    }

    output
}

/// Format an operand with its addressing mode.
fn format_operand(mode: ParamMode, raw: Word) -> String {
    match mode {
        ParamMode::Position => format!("[{}]", raw),
        ParamMode::Immediate => format!("#{}", raw),
        ParamMode::Relative if raw < 0 => format!("[rb{}]", raw),
        ParamMode::Relative => format!("[rb+{}]", raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(words: &[Word], addr: u64) -> (String, u64) {
        disassemble_at(&Memory::from_program(words), addr)
    }

    #[test]
    fn test_disassemble_hlt() {
        assert_eq!(at(&[99], 0), ("HLT".to_string(), 1));
    }

    #[test]
    fn test_disassemble_modes() {
        assert_eq!(at(&[1002, 4, 3, 4], 0), ("MUL [4], #3, [4]".to_string(), 4));
        assert_eq!(at(&[204, -1], 0), ("OUT [rb-1]".to_string(), 2));
        assert_eq!(at(&[109, 1], 0), ("ARB #1".to_string(), 2));
        assert_eq!(at(&[0, 1106, 0, 36], 1), ("JZ #0, #36".to_string(), 3));
    }

    #[test]
    fn test_disassemble_invalid_word() {
        assert_eq!(at(&[33], 0), ("DAT 33".to_string(), 1));
        assert_eq!(at(&[-7], 0), ("DAT -7".to_string(), 1));
    }

    #[test]
    fn test_disassemble_listing() {
        let listing = disassemble(&[3, 0, 4, 0, 99]);
        assert!(listing.contains("0000: IN [0]"));
        assert!(listing.contains("0002: OUT [0]"));
        assert!(listing.contains("0004: HLT"));
    }

    #[test]
    fn test_listing_truncated_instruction() {
        // ADD with its operands cut off by the end of the program.
        let listing = disassemble(&[1, 5]);
        assert!(listing.contains("0000: ADD [5], [0], [0]"));
        assert!(listing.contains("; 1,5"));
    }
}

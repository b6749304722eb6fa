//! Comma-separated program format.
//!
//! A program is a list of integers separated by commas:
//! - Whitespace and newlines around values are ignored
//! - A single trailing comma is accepted
//! - Blank text is an empty program

use crate::cpu::Word;
use std::path::Path;
use thiserror::Error;

/// Parse program text into memory words.
pub fn parse_program(text: &str) -> Result<Vec<Word>, ProgramError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let tokens: Vec<&str> = text.split(',').map(str::trim).collect();
    let last = tokens.len() - 1;

    let mut words = Vec::with_capacity(tokens.len());
    for (index, token) in tokens.iter().enumerate() {
        if token.is_empty() {
            if index == last {
                break;
            }
            return Err(ProgramError::ParseError {
                index,
                token: String::new(),
                message: "empty value".into(),
            });
        }

        let word = token.parse::<Word>().map_err(|e| ProgramError::ParseError {
            index,
            token: token.to_string(),
            message: e.to_string(),
        })?;
        words.push(word);
    }

    Ok(words)
}

/// Load a program file from disk.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Vec<Word>, ProgramError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ProgramError::IoError(e.to_string()))?;
    parse_program(&text)
}

/// Render words in the program format.
pub fn format_program(words: &[Word]) -> String {
    words
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Errors that can occur while loading programs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error at value {index} ({token:?}): {message}")]
    ParseError { index: usize, token: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        assert_eq!(parse_program("1,0,0,3,99").unwrap(), vec![1, 0, 0, 3, 99]);
    }

    #[test]
    fn test_parse_whitespace_and_newlines() {
        let text = " 109, -1,\n 204,\t1125899906842624 \n";
        assert_eq!(
            parse_program(text).unwrap(),
            vec![109, -1, 204, 1125899906842624]
        );
    }

    #[test]
    fn test_parse_trailing_comma() {
        assert_eq!(parse_program("3,0,4,0,99,\n").unwrap(), vec![3, 0, 4, 0, 99]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_program("").unwrap().is_empty());
        assert!(parse_program("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_program("1,,2"),
            Err(ProgramError::ParseError {
                index: 1,
                token: String::new(),
                message: "empty value".into(),
            })
        );

        match parse_program("1,x2,3") {
            Err(ProgramError::ParseError { index, token, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(token, "x2");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("intcode-parse-{}.txt", std::process::id()));
        let words = vec![1102, 34915192, 34915192, 7, 4, 7, 99, 0];

        std::fs::write(&path, format!("{}\n", format_program(&words))).unwrap();
        let loaded = load_program(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, words);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_program("/nonexistent/intcode/program.txt");
        assert!(matches!(result, Err(ProgramError::IoError(_))));
    }
}

//! Self-test harness.
//!
//! Chainable assertions over a machine's memory image, halt state and
//! output, plus a fixed battery of scripted programs that exercises the
//! decoder and every opcode.
//!
//! ```
//! use intcode::Machine;
//!
//! # fn main() -> Result<(), intcode::harness::HarnessError> {
//! Machine::new(&[1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50])
//!     .then_step()?
//!     .assert_memory(&[1, 9, 10, 70, 2, 3, 11, 0, 99, 30, 40, 50])?
//!     .then_step()?
//!     .assert_memory(&[3500, 9, 10, 70, 2, 3, 11, 0, 99, 30, 40, 50])?
//!     .then_step()?
//!     .assert_halted()?;
//! # Ok(())
//! # }
//! ```

use crate::cpu::{CpuError, Machine, Word};
use crate::network::{AmplifierNetwork, NetworkError};
use thiserror::Error;

/// An expected value did not match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("assertion failed on {what}: expected {expected}, got {actual}")]
pub struct AssertionFailure {
    pub what: &'static str,
    pub expected: String,
    pub actual: String,
}

/// Errors surfaced by a self-test scenario.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    #[error("machine error: {0}")]
    Machine(#[from] CpuError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),
}

impl Machine {
    /// Step once, as part of an assertion chain.
    pub fn then_step(&mut self) -> Result<&mut Self, HarnessError> {
        self.step()?;
        Ok(self)
    }

    /// Run with `inputs`, as part of an assertion chain.
    pub fn then_run(&mut self, inputs: &[Word]) -> Result<&mut Self, HarnessError> {
        self.run(inputs)?;
        Ok(self)
    }

    /// Assert the full memory image: `expected` at `0..n`, zero beyond.
    pub fn assert_memory(&mut self, expected: &[Word]) -> Result<&mut Self, HarnessError> {
        if !self.mem.matches_image(expected) {
            let prefix: Vec<Word> = self
                .mem
                .dump(0, expected.len())
                .into_iter()
                .map(|(_, value)| value)
                .collect();
            let beyond = self.mem.nonzero_from(expected.len() as u64);

            let actual = if beyond.is_empty() {
                format!("{:?}", prefix)
            } else {
                format!("{:?} then {:?}", prefix, beyond)
            };
            return Err(AssertionFailure {
                what: "memory",
                expected: format!("{:?}", expected),
                actual,
            }
            .into());
        }
        Ok(self)
    }

    /// Assert that the machine has halted.
    pub fn assert_halted(&mut self) -> Result<&mut Self, HarnessError> {
        if !self.is_halted() {
            return Err(AssertionFailure {
                what: "state",
                expected: "Halted".into(),
                actual: format!("{:?}", self.state()),
            }
            .into());
        }
        Ok(self)
    }

    /// Assert that the machine has halted with exactly `expected` as the
    /// output of its last run.
    pub fn assert_output(&mut self, expected: &[Word]) -> Result<&mut Self, HarnessError> {
        self.assert_halted()?;
        if self.output() != expected {
            return Err(AssertionFailure {
                what: "output",
                expected: format!("{:?}", expected),
                actual: format!("{:?}", self.output()),
            }
            .into());
        }
        Ok(self)
    }
}

fn expect_signal(actual: Word, expected: Word) -> Result<(), HarnessError> {
    if actual != expected {
        return Err(AssertionFailure {
            what: "signal",
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
        .into());
    }
    Ok(())
}

fn expect_output(program: &[Word], inputs: &[Word], expected: &[Word]) -> Result<(), HarnessError> {
    Machine::new(program).then_run(inputs)?.assert_output(expected)?;
    Ok(())
}

fn expect_memory(program: &[Word], expected: &[Word]) -> Result<(), HarnessError> {
    Machine::new(program).then_run(&[])?.assert_halted()?.assert_memory(expected)?;
    Ok(())
}

/// Outputs its own initial memory.
pub const QUINE: [Word; 16] = [
    109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99,
];

/// Outputs 999, 1000 or 1001 as the input is below, equal to or above 8.
pub const COMPARE_TO_EIGHT: [Word; 47] = [
    3, 21, 1008, 21, 8, 20, 1005, 20, 22, 107, 8, 21, 20, 1006, 20, 31, 1106, 0, 36, 98, 0, 0,
    1002, 21, 125, 20, 4, 20, 1105, 1, 46, 104, 999, 1105, 1, 46, 1101, 1000, 1, 20, 4, 20, 1105,
    1, 46, 98, 99,
];

/// Five-stage feedback amplifier program.
pub const FEEDBACK_LOOP: [Word; 29] = [
    3, 26, 1001, 26, -4, 26, 3, 27, 1002, 27, 2, 27, 1, 27, 26, 27, 4, 27, 1001, 28, -1, 28, 1005,
    28, 6, 99, 0, 0, 5,
];

/// Second feedback program, with a longer inner loop.
pub const FEEDBACK_LOOP_LONG: [Word; 57] = [
    3, 52, 1001, 52, -5, 52, 3, 53, 1, 52, 56, 54, 1007, 54, 5, 55, 1005, 55, 26, 1001, 54, -5, 54,
    1105, 1, 12, 1, 53, 54, 53, 1008, 54, 0, 55, 1001, 55, 1, 55, 2, 53, 55, 53, 4, 53, 1001, 56,
    -1, 56, 1005, 56, 6, 99, 0, 0, 0, 0, 10,
];

/// A named self-test scenario.
#[derive(Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub check: fn() -> Result<(), HarnessError>,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario").field("name", &self.name).finish()
    }
}

/// The fixed battery of scripted programs.
pub fn battery() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "add and multiply, one step at a time",
            check: || {
                Machine::new(&[1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50])
                    .then_step()?
                    .assert_memory(&[1, 9, 10, 70, 2, 3, 11, 0, 99, 30, 40, 50])?
                    .then_step()?
                    .assert_memory(&[3500, 9, 10, 70, 2, 3, 11, 0, 99, 30, 40, 50])?
                    .then_step()?
                    .assert_halted()?;
                Ok(())
            },
        },
        Scenario {
            name: "add into own opcode",
            check: || {
                Machine::new(&[1, 0, 0, 0, 99]).then_step()?.assert_memory(&[2, 0, 0, 0, 99])?;
                Ok(())
            },
        },
        Scenario {
            name: "multiply past the program end",
            check: || {
                Machine::new(&[2, 4, 4, 5, 99, 0])
                    .then_step()?
                    .assert_memory(&[2, 4, 4, 5, 99, 9801])?;
                Ok(())
            },
        },
        Scenario {
            name: "self-modifying program",
            check: || expect_memory(&[1, 1, 1, 4, 99, 5, 6, 0, 99], &[30, 1, 1, 4, 2, 5, 6, 0, 99]),
        },
        Scenario {
            name: "echo input",
            check: || expect_output(&[3, 0, 4, 0, 99], &[42], &[42]),
        },
        Scenario {
            name: "surplus input ignored",
            check: || expect_output(&[3, 0, 4, 0, 99], &[1337, 55], &[1337]),
        },
        Scenario {
            name: "immediate operand patches halt",
            check: || expect_memory(&[1002, 4, 3, 4, 33], &[1002, 4, 3, 4, 99]),
        },
        Scenario {
            name: "negative immediate operand",
            check: || expect_memory(&[1101, 100, -1, 4, 0], &[1101, 100, -1, 4, 99]),
        },
        Scenario {
            name: "equals, position mode",
            check: || {
                let program = [3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8];
                expect_output(&program, &[8], &[1])?;
                expect_output(&program, &[9], &[0])
            },
        },
        Scenario {
            name: "less than, position mode",
            check: || {
                let program = [3, 9, 7, 9, 10, 9, 4, 9, 99, -1, 8];
                expect_output(&program, &[7], &[1])?;
                expect_output(&program, &[9], &[0])
            },
        },
        Scenario {
            name: "equals, immediate mode",
            check: || {
                let program = [3, 3, 1108, -1, 8, 3, 4, 3, 99];
                expect_output(&program, &[8], &[1])?;
                expect_output(&program, &[9], &[0])
            },
        },
        Scenario {
            name: "less than, immediate mode",
            check: || {
                let program = [3, 3, 1107, -1, 8, 3, 4, 3, 99];
                expect_output(&program, &[7], &[1])?;
                expect_output(&program, &[8], &[0])
            },
        },
        Scenario {
            name: "jump, position mode",
            check: || {
                let program = [3, 12, 6, 12, 15, 1, 13, 14, 13, 4, 13, 99, -1, 0, 1, 9];
                expect_output(&program, &[0], &[0])?;
                expect_output(&program, &[1], &[1])
            },
        },
        Scenario {
            name: "jump, immediate mode",
            check: || {
                let program = [3, 3, 1105, -1, 9, 1101, 0, 0, 12, 4, 12, 99, 1];
                expect_output(&program, &[0], &[0])?;
                expect_output(&program, &[1], &[1])
            },
        },
        Scenario {
            name: "compare to eight",
            check: || {
                expect_output(&COMPARE_TO_EIGHT, &[7], &[999])?;
                expect_output(&COMPARE_TO_EIGHT, &[8], &[1000])?;
                expect_output(&COMPARE_TO_EIGHT, &[9], &[1001])
            },
        },
        Scenario {
            name: "quine",
            check: || expect_output(&QUINE, &[], &QUINE),
        },
        Scenario {
            name: "wide multiplication",
            check: || {
                Machine::new(&[1102, 34915192, 34915192, 7, 4, 7, 99, 0])
                    .then_run(&[])?
                    .assert_halted()?;
                Ok(())
            },
        },
        Scenario {
            name: "large literal output",
            check: || expect_output(&[104, 1125899906842624, 99], &[], &[1125899906842624]),
        },
        Scenario {
            name: "suspend and resume on input",
            check: || {
                let program = [3, 11, 3, 12, 1, 11, 12, 13, 4, 13, 99, 0, 0, 0];
                let mut machine = Machine::new(&program);
                machine.run(&[20])?;
                if !machine.is_awaiting_input() || machine.pc() != 2 {
                    return Err(AssertionFailure {
                        what: "suspension",
                        expected: "AwaitingInput at pc 2".into(),
                        actual: format!("{:?} at pc {}", machine.state(), machine.pc()),
                    }
                    .into());
                }
                machine.then_run(&[22])?.assert_output(&[42])?;
                Ok(())
            },
        },
        Scenario {
            name: "amplifier series",
            check: || {
                let program = [3, 15, 3, 16, 1002, 16, 10, 16, 1, 16, 15, 15, 4, 15, 99, 0, 0];
                let signal = AmplifierNetwork::new(&program).run_series(&[4, 3, 2, 1, 0])?;
                expect_signal(signal, 43210)
            },
        },
        Scenario {
            name: "amplifier feedback ring",
            check: || {
                let net = AmplifierNetwork::new(&FEEDBACK_LOOP);
                expect_signal(net.run_feedback(&[9, 8, 7, 6, 5])?, 139629729)?;
                let net = AmplifierNetwork::new(&FEEDBACK_LOOP_LONG);
                expect_signal(net.run_feedback(&[9, 7, 8, 5, 6])?, 18216)
            },
        },
    ]
}

/// Outcome of running the battery.
#[derive(Debug, Clone)]
pub struct BatteryReport {
    pub results: Vec<(&'static str, Result<(), HarnessError>)>,
}

impl BatteryReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

/// Run every scenario in the battery.
pub fn run_battery() -> BatteryReport {
    let results = battery()
        .into_iter()
        .map(|scenario| (scenario.name, (scenario.check)()))
        .collect();
    BatteryReport { results }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_passes() {
        let report = run_battery();
        for (name, result) in &report.results {
            assert!(result.is_ok(), "{}: {:?}", name, result);
        }
        assert!(report.all_passed());
        assert_eq!(report.passed(), battery().len());
    }

    #[test]
    fn test_assert_memory_trailing_zeros() {
        let mut machine = Machine::new(&[1, 2, 0, 0]);
        assert!(machine.assert_memory(&[1, 2]).is_ok());
        assert!(machine.assert_memory(&[1, 2, 0, 0, 0]).is_ok());
        assert!(machine.assert_memory(&[1, 2, 3]).is_err());
        assert!(machine.assert_memory(&[1]).is_err());
    }

    #[test]
    fn test_assert_memory_after_far_write() {
        let program = [1101, 1, 1, 1 << 62, 99];
        let mut machine = Machine::new(&program);
        assert!(machine.run(&[]).unwrap().is_halted());
        assert_eq!(machine.memory().read(1 << 62), 2);

        match machine.assert_memory(&program) {
            Err(HarnessError::Assertion(failure)) => {
                assert_eq!(failure.what, "memory");
                assert_eq!(failure.actual, format!("{:?} then [({}, 2)]", program, 1u64 << 62));
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }

        // Writing zero far away leaves the image unchanged.
        let program = [1101, 0, 0, 1 << 62, 99];
        Machine::new(&program)
            .then_run(&[])
            .unwrap()
            .assert_memory(&program)
            .unwrap();
    }

    #[test]
    fn test_assert_memory_failure() {
        let err = Machine::new(&[99, 1]).assert_memory(&[99, 2]).unwrap_err();
        match err {
            HarnessError::Assertion(failure) => {
                assert_eq!(failure.what, "memory");
                assert_eq!(failure.actual, "[99, 1]");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_assert_output_requires_halt() {
        let mut machine = Machine::new(&[104, 7, 3, 0, 99]);
        machine.run(&[]).unwrap();

        assert_eq!(machine.output(), &[7]);
        assert!(matches!(
            machine.assert_output(&[7]),
            Err(HarnessError::Assertion(AssertionFailure { what: "state", .. }))
        ));
    }

    #[test]
    fn test_machine_error_propagates() {
        let err = Machine::new(&[42]).then_step().unwrap_err();
        assert!(matches!(err, HarnessError::Machine(CpuError::DecodeError(_))));
    }
}

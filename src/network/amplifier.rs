//! Amplifier chains.
//!
//! Every stage runs its own copy of the same program. A stage is first fed
//! its phase setting, then the signal coming from the previous stage; the
//! first stage starts from signal 0.
//!
//! - Series: stages run once each, left to right.
//! - Feedback: the last stage feeds the first, and stages run in rotation
//!   until every stage halts.

use crate::cpu::{CpuError, InputMode, Machine, Word};
use thiserror::Error;
use tracing::{debug, trace};

/// A chain of amplifier stages sharing one program.
#[derive(Debug, Clone)]
pub struct AmplifierNetwork {
    program: Vec<Word>,
}

impl AmplifierNetwork {
    /// Create a network whose stages all run `program`.
    pub fn new(program: &[Word]) -> Self {
        Self {
            program: program.to_vec(),
        }
    }

    /// Run one stage per phase in series and return the final signal.
    ///
    /// Each stage gets all its input up front, so starvation is fatal.
    pub fn run_series(&self, phases: &[Word]) -> Result<Word, NetworkError> {
        if phases.is_empty() {
            return Err(NetworkError::NoPhases);
        }

        let mut signal = 0;
        for (stage, &phase) in phases.iter().enumerate() {
            let mut machine = Machine::new(&self.program).with_input_mode(InputMode::Hard);
            let outcome = machine
                .run(&[phase, signal])
                .map_err(|source| NetworkError::Machine { stage, source })?;

            signal = *outcome.output().first().ok_or(NetworkError::NoOutput { stage })?;
            trace!(stage, phase, signal, "series stage done");
        }

        Ok(signal)
    }

    /// Run the stages as a feedback ring until every stage has halted, and
    /// return the last signal emitted by the final stage.
    ///
    /// The whole output batch of one stage becomes the input batch of the
    /// next; output sent to a halted stage is dropped. A round in which no
    /// stage produces output or halts means the ring can make no further
    /// progress and is reported as `Stalled`.
    pub fn run_feedback(&self, phases: &[Word]) -> Result<Word, NetworkError> {
        if phases.is_empty() {
            return Err(NetworkError::NoPhases);
        }

        let mut machines: Vec<Machine> = phases.iter().map(|_| Machine::new(&self.program)).collect();
        let last = machines.len() - 1;

        let mut batch: Vec<Word> = vec![0];
        let mut final_signal = None;
        let mut round = 0usize;

        loop {
            let mut progressed = false;

            for (stage, machine) in machines.iter_mut().enumerate() {
                if machine.is_halted() {
                    batch.clear();
                    continue;
                }

                let mut inputs = Vec::with_capacity(batch.len() + 1);
                if round == 0 {
                    inputs.push(phases[stage]);
                }
                inputs.append(&mut batch);

                let outcome = machine
                    .run(&inputs)
                    .map_err(|source| NetworkError::Machine { stage, source })?;

                progressed |= outcome.is_halted() || !outcome.output().is_empty();
                batch = outcome.into_output();

                if stage == last {
                    if let Some(&signal) = batch.last() {
                        final_signal = Some(signal);
                    }
                }
            }

            debug!(round, signal = ?final_signal, "feedback round done");

            if machines.iter().all(Machine::is_halted) {
                return final_signal.ok_or(NetworkError::NoOutput { stage: last });
            }
            if !progressed {
                return Err(NetworkError::Stalled { round });
            }
            round += 1;
        }
    }

    /// Best series signal over every ordering of `phases`.
    /// Returns the signal and the ordering that produced it.
    pub fn best_series(&self, phases: &[Word]) -> Result<(Word, Vec<Word>), NetworkError> {
        self.best_by(phases, |order| self.run_series(order))
    }

    /// Best feedback signal over every ordering of `phases`.
    pub fn best_feedback(&self, phases: &[Word]) -> Result<(Word, Vec<Word>), NetworkError> {
        self.best_by(phases, |order| self.run_feedback(order))
    }

    fn best_by<F>(&self, phases: &[Word], run: F) -> Result<(Word, Vec<Word>), NetworkError>
    where
        F: Fn(&[Word]) -> Result<Word, NetworkError>,
    {
        let mut best: Option<(Word, Vec<Word>)> = None;
        for order in permutations(phases) {
            let signal = run(&order)?;
            if best.as_ref().map_or(true, |(top, _)| signal > *top) {
                best = Some((signal, order));
            }
        }
        best.ok_or(NetworkError::NoPhases)
    }
}

/// Every ordering of `items` (Heap's algorithm).
pub fn permutations(items: &[Word]) -> Vec<Vec<Word>> {
    if items.is_empty() {
        return Vec::new();
    }

    let mut current = items.to_vec();
    let mut counters = vec![0usize; current.len()];
    let mut result = vec![current.clone()];

    let mut i = 1;
    while i < current.len() {
        if counters[i] < i {
            let j = if i % 2 == 0 { 0 } else { counters[i] };
            current.swap(j, i);
            result.push(current.clone());
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }

    result
}

/// Errors from driving a network of machines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("no phase settings given")]
    NoPhases,

    #[error("stage {stage} failed: {source}")]
    Machine {
        stage: usize,
        #[source]
        source: CpuError,
    },

    #[error("stage {stage} produced no output")]
    NoOutput { stage: usize },

    #[error("feedback ring stalled in round {round}")]
    Stalled { round: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::DecodeError;
    use std::collections::HashSet;

    const SERIES_A: [Word; 17] = [3, 15, 3, 16, 1002, 16, 10, 16, 1, 16, 15, 15, 4, 15, 99, 0, 0];

    const FEEDBACK_A: [Word; 29] = [
        3, 26, 1001, 26, -4, 26, 3, 27, 1002, 27, 2, 27, 1, 27, 26, 27, 4, 27, 1001, 28, -1, 28,
        1005, 28, 6, 99, 0, 0, 5,
    ];

    #[test]
    fn test_series() {
        let net = AmplifierNetwork::new(&SERIES_A);
        assert_eq!(net.run_series(&[4, 3, 2, 1, 0]).unwrap(), 43210);
    }

    #[test]
    fn test_best_series() {
        let net = AmplifierNetwork::new(&SERIES_A);
        let (signal, order) = net.best_series(&[0, 1, 2, 3, 4]).unwrap();
        assert_eq!(signal, 43210);
        assert_eq!(order, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_feedback() {
        let net = AmplifierNetwork::new(&FEEDBACK_A);
        assert_eq!(net.run_feedback(&[9, 8, 7, 6, 5]).unwrap(), 139629729);
    }

    #[test]
    fn test_best_feedback() {
        let net = AmplifierNetwork::new(&FEEDBACK_A);
        let (signal, order) = net.best_feedback(&[5, 6, 7, 8, 9]).unwrap();
        assert_eq!(signal, 139629729);
        assert_eq!(net.run_feedback(&order).unwrap(), signal);
    }

    /// Phase 0 reads one extra value after its output; any other phase
    /// halts straight away. The word at 16 is what the phase-0 stage runs
    /// after that extra read.
    fn outliving_stage(tail: Word) -> Vec<Word> {
        vec![
            3, 100, 3, 101, 1001, 101, 1, 101, 4, 101, 1006, 100, 14, 99, 3, 101, tail,
        ]
    }

    #[test]
    fn test_feedback_drives_every_stage_to_halt() {
        let net = AmplifierNetwork::new(&outliving_stage(99));
        assert_eq!(net.run_feedback(&[0, 1]).unwrap(), 2);
    }

    #[test]
    fn test_feedback_reports_fault_after_last_stage_halts() {
        // The last stage halts in round 0; stage 0 faults in round 1.
        let net = AmplifierNetwork::new(&outliving_stage(98));
        assert_eq!(
            net.run_feedback(&[0, 1]),
            Err(NetworkError::Machine {
                stage: 0,
                source: CpuError::DecodeError(DecodeError::InvalidOpcode { word: 98, addr: 16 }),
            })
        );
    }

    #[test]
    fn test_series_starvation_is_fatal() {
        // Reads three values but each stage only gets two.
        let net = AmplifierNetwork::new(&[3, 0, 3, 0, 3, 0, 99]);
        assert_eq!(
            net.run_series(&[1]),
            Err(NetworkError::Machine {
                stage: 0,
                source: CpuError::InputStarvation { pc: 4 },
            })
        );
    }

    #[test]
    fn test_series_no_output() {
        let net = AmplifierNetwork::new(&[3, 0, 3, 0, 99]);
        assert_eq!(net.run_series(&[1, 2]), Err(NetworkError::NoOutput { stage: 0 }));
    }

    #[test]
    fn test_feedback_stalled() {
        // Reads forever without ever producing output.
        let net = AmplifierNetwork::new(&[3, 0, 1105, 1, 0]);
        assert_eq!(net.run_feedback(&[1, 2]), Err(NetworkError::Stalled { round: 0 }));
    }

    #[test]
    fn test_no_phases() {
        let net = AmplifierNetwork::new(&SERIES_A);
        assert_eq!(net.run_series(&[]), Err(NetworkError::NoPhases));
        assert_eq!(net.run_feedback(&[]), Err(NetworkError::NoPhases));
        assert_eq!(net.best_series(&[]), Err(NetworkError::NoPhases));
    }

    #[test]
    fn test_permutations() {
        let perms = permutations(&[1, 2, 3, 4]);
        assert_eq!(perms.len(), 24);

        let unique: HashSet<Vec<Word>> = perms.into_iter().collect();
        assert_eq!(unique.len(), 24);
        assert!(unique.contains(&vec![4, 3, 2, 1]));

        assert_eq!(permutations(&[7]), vec![vec![7]]);
        assert!(permutations(&[]).is_empty());
    }
}

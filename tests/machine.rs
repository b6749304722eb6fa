//! End-to-end behaviour of the machine through the public API.

use intcode::harness::{FEEDBACK_LOOP, QUINE};
use intcode::{
    parse_program, AmplifierNetwork, CpuError, InputMode, Machine, MachineState, RunOutcome,
    StepOutcome, Word,
};
use proptest::prelude::*;

/// Reads two values and outputs their sum.
const SUM_TWO: [Word; 14] = [3, 11, 3, 12, 1, 11, 12, 13, 4, 13, 99, 0, 0, 0];

#[test]
fn step_sequence_rewrites_memory() {
    let mut machine = Machine::new(&[1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50]);

    assert_eq!(machine.step().unwrap(), StepOutcome::Continued);
    assert_eq!(machine.memory().to_vec().unwrap(), vec![1, 9, 10, 70, 2, 3, 11, 0, 99, 30, 40, 50]);

    assert_eq!(machine.step().unwrap(), StepOutcome::Continued);
    assert_eq!(machine.memory().to_vec().unwrap(), vec![3500, 9, 10, 70, 2, 3, 11, 0, 99, 30, 40, 50]);

    assert_eq!(machine.step().unwrap(), StepOutcome::Halted);
    assert!(machine.is_halted());
}

#[test]
fn echo_returns_input() {
    let mut machine = Machine::new(&[3, 0, 4, 0, 99]);
    assert_eq!(machine.run(&[42]).unwrap(), RunOutcome::Halted(vec![42]));
}

#[test]
fn wide_multiply_halts() {
    let mut machine = Machine::new(&[1102, 34915192, 34915192, 7, 4, 7, 99, 0]);
    let outcome = machine.run(&[]).unwrap();
    assert!(outcome.is_halted());
    assert_eq!(outcome.output(), &[1219070632396864]);
}

#[test]
fn large_literal_is_output_exactly() {
    let mut machine = Machine::new(&[104, 1125899906842624, 99]);
    assert_eq!(machine.run(&[]).unwrap(), RunOutcome::Halted(vec![1125899906842624]));
}

#[test]
fn quine_outputs_itself() {
    let mut machine = Machine::new(&QUINE);
    assert_eq!(machine.run(&[]).unwrap(), RunOutcome::Halted(QUINE.to_vec()));
}

#[test]
fn feedback_ring_signal() {
    let network = AmplifierNetwork::new(&FEEDBACK_LOOP);
    assert_eq!(network.run_feedback(&[9, 8, 7, 6, 5]).unwrap(), 139629729);
}

#[test]
fn operand_resolution_is_idempotent() {
    // ADD [rb+3], #7 -> [9] after ARB #2
    let mut machine = Machine::new(&[109, 2, 1201, 3, 7, 9, 99, 0, 0, 0]);
    machine.step().unwrap();
    assert_eq!(machine.relative_base(), 2);

    let before = machine.memory().clone();
    let first = (machine.operand(0).unwrap(), machine.operand(1).unwrap());
    let second = (machine.operand(0).unwrap(), machine.operand(1).unwrap());

    assert_eq!(first, second);
    assert_eq!(first, (9, 7));
    assert_eq!(machine.memory(), &before);
    assert_eq!(machine.pc(), 2);
}

#[test]
fn parsed_program_runs() {
    let program = parse_program("1,0,0,0,99\n").unwrap();
    let mut machine = Machine::new(&program);
    machine.run(&[]).unwrap();
    assert_eq!(machine.memory().to_vec().unwrap(), vec![2, 0, 0, 0, 99]);
}

#[test]
fn suspended_state_as_json() {
    let mut machine = Machine::new(&SUM_TWO);
    assert_eq!(machine.run(&[40]).unwrap(), RunOutcome::AwaitingInput(vec![]));

    let json = serde_json::to_value(&machine).unwrap();
    assert_eq!(json["state"], "AwaitingInput");
    assert_eq!(json["regs"]["pc"], 2);
    assert_eq!(json["steps"], 1);
    assert_eq!(json["mem"]["cells"]["11"], 40);

    assert_eq!(machine.run(&[2]).unwrap(), RunOutcome::Halted(vec![42]));
}

#[test]
fn hard_mode_starvation_faults() {
    let mut machine = Machine::new(&SUM_TWO).with_input_mode(InputMode::Hard);
    assert_eq!(machine.run(&[1]), Err(CpuError::InputStarvation { pc: 2 }));
    assert!(machine.is_faulted());
    assert_eq!(machine.run(&[2]), Err(CpuError::NotRunning(MachineState::Faulted)));
}

#[test]
fn halted_machine_stays_halted() {
    let mut machine = Machine::new(&[99]);
    assert!(machine.run(&[]).unwrap().is_halted());
    let steps = machine.steps();

    assert_eq!(machine.step().unwrap(), StepOutcome::Halted);
    assert_eq!(machine.run(&[1, 2]).unwrap(), RunOutcome::Halted(vec![]));
    assert_eq!(machine.steps(), steps);
}

proptest! {
    #[test]
    fn prop_split_input_matches_single_batch(
        a in -1_000_000_000i64..1_000_000_000,
        b in -1_000_000_000i64..1_000_000_000,
    ) {
        let mut whole = Machine::new(&SUM_TWO);
        let expected = whole.run(&[a, b]).unwrap();
        prop_assert_eq!(expected.clone(), RunOutcome::Halted(vec![a + b]));

        let mut split = Machine::new(&SUM_TWO);
        let first = split.run(&[a]).unwrap();
        prop_assert_eq!(first, RunOutcome::AwaitingInput(vec![]));
        prop_assert_eq!(split.pc(), 2);

        let second = split.run(&[b]).unwrap();
        prop_assert_eq!(second, expected);
        prop_assert_eq!(split.memory(), whole.memory());
    }

    #[test]
    fn prop_echo_any_value(v in any::<i64>()) {
        let mut machine = Machine::new(&[3, 0, 4, 0, 99]);
        prop_assert_eq!(machine.run(&[v]).unwrap(), RunOutcome::Halted(vec![v]));
    }
}

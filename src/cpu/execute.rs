//! Execution engine for Intcode.
//!
//! Implements the fetch-decode-execute cycle, the input queue and output
//! sequence, and the run/suspend/resume contract.

use crate::cpu::{Memory, Registers};
use crate::cpu::decode::{self, Instruction, Opcode, Target, DecodeError};
use crate::cpu::memory::{MemoryError, Word};
use serde::Serialize;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Machine execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MachineState {
    /// Loaded, nothing executed since the last input was provided.
    #[default]
    Ready,
    /// Executing instructions.
    Running,
    /// Suspended on an input instruction with an empty queue.
    AwaitingInput,
    /// Executed the halt instruction. Terminal.
    Halted,
    /// Aborted on a fatal error. Terminal.
    Faulted,
}

/// What to do when an input instruction finds the queue empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum InputMode {
    /// Suspend in [`MachineState::AwaitingInput`] until the next run.
    #[default]
    Interactive,
    /// Treat starvation as a fatal [`CpuError::InputStarvation`].
    Hard,
}

/// Engine options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MachineConfig {
    pub input_mode: InputMode,
}

/// Result of executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The instruction completed; more may follow.
    Continued,
    /// The machine is halted.
    Halted,
    /// The machine is suspended waiting for input.
    AwaitingInput,
}

/// Result of a run call, carrying the output produced during that call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Stopped because the step budget ran out.
    Continued(Vec<Word>),
    /// The machine halted.
    Halted(Vec<Word>),
    /// The machine needs more input to go on.
    AwaitingInput(Vec<Word>),
}

impl RunOutcome {
    /// Output produced during the call.
    pub fn output(&self) -> &[Word] {
        match self {
            RunOutcome::Continued(out)
            | RunOutcome::Halted(out)
            | RunOutcome::AwaitingInput(out) => out,
        }
    }

    /// Consume the outcome, keeping only the output.
    pub fn into_output(self) -> Vec<Word> {
        match self {
            RunOutcome::Continued(out)
            | RunOutcome::Halted(out)
            | RunOutcome::AwaitingInput(out) => out,
        }
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, RunOutcome::Halted(_))
    }

    pub fn is_awaiting_input(&self) -> bool {
        matches!(self, RunOutcome::AwaitingInput(_))
    }
}

/// One Intcode machine: memory, registers, I/O queues and status.
#[derive(Clone, Serialize)]
pub struct Machine {
    /// Machine registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    state: MachineState,
    config: MachineConfig,
    input: VecDeque<Word>,
    output: Vec<Word>,
    /// Instruction count (for profiling).
    steps: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Machine {
    /// Create a machine with `program` loaded at address 0.
    pub fn new(program: &[Word]) -> Self {
        Self::with_config(program, MachineConfig::default())
    }

    /// Create a machine with explicit options.
    pub fn with_config(program: &[Word], config: MachineConfig) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::from_program(program),
            state: MachineState::Ready,
            config,
            input: VecDeque::new(),
            output: Vec::new(),
            steps: 0,
            last_instr: None,
        }
    }

    /// Builder: choose the input starvation policy.
    pub fn with_input_mode(mut self, mode: InputMode) -> Self {
        self.config.input_mode = mode;
        self
    }

    /// Replace the input queue and clear a pending input stall, without
    /// executing anything.
    ///
    /// Unconsumed values from an earlier call are discarded.
    pub fn provide_input(&mut self, inputs: &[Word]) {
        self.input = inputs.iter().copied().collect();
        if self.state == MachineState::AwaitingInput {
            self.state = MachineState::Ready;
        }
    }

    /// Execute a single instruction.
    ///
    /// Stepping a halted machine does nothing and reports `Halted`.
    /// A fatal error moves the machine to `Faulted`, after which every
    /// step fails with `NotRunning`.
    pub fn step(&mut self) -> Result<StepOutcome, CpuError> {
        match self.state {
            MachineState::Halted => return Ok(StepOutcome::Halted),
            MachineState::Faulted => return Err(CpuError::NotRunning(self.state)),
            _ => {}
        }

        let pc = self.regs.pc;
        match self.execute_at(pc) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(pc, error = %e, "machine faulted");
                self.state = MachineState::Faulted;
                Err(e)
            }
        }
    }

    /// Run with a fresh input batch until the machine halts or needs more
    /// input.
    ///
    /// Output from earlier calls is cleared first, so the returned output
    /// holds only what this call produced.
    pub fn run(&mut self, inputs: &[Word]) -> Result<RunOutcome, CpuError> {
        self.run_inner(inputs, None)
    }

    /// Like [`Machine::run`], but executes at most `max_steps` instructions.
    pub fn run_limited(&mut self, inputs: &[Word], max_steps: u64) -> Result<RunOutcome, CpuError> {
        self.run_inner(inputs, Some(max_steps))
    }

    fn run_inner(&mut self, inputs: &[Word], limit: Option<u64>) -> Result<RunOutcome, CpuError> {
        if self.state == MachineState::Faulted {
            return Err(CpuError::NotRunning(self.state));
        }

        self.output.clear();
        self.provide_input(inputs);

        let mut executed = 0u64;
        loop {
            if limit.is_some_and(|max| executed >= max) {
                return Ok(RunOutcome::Continued(self.output.clone()));
            }

            match self.step()? {
                StepOutcome::Continued => executed += 1,
                StepOutcome::Halted => return Ok(RunOutcome::Halted(self.output.clone())),
                StepOutcome::AwaitingInput => {
                    return Ok(RunOutcome::AwaitingInput(self.output.clone()));
                }
            }
        }
    }

    /// Fetch, decode and execute the instruction at `pc`.
    fn execute_at(&mut self, pc: u64) -> Result<StepOutcome, CpuError> {
        let word = self.mem.read(pc);
        let instr = decode::decode(word, pc)?;
        trace!(pc, word, op = instr.opcode.mnemonic(), rb = self.regs.relative_base, "step");

        let mut jumped = false;
        match instr.opcode {
            Opcode::Add => {
                let a = self.read_operand(&instr, 0)?;
                let b = self.read_operand(&instr, 1)?;
                let sum = a.checked_add(b).ok_or(CpuError::Overflow { pc })?;
                self.write_operand(&instr, 2, sum)?;
            }

            Opcode::Mul => {
                let a = self.read_operand(&instr, 0)?;
                let b = self.read_operand(&instr, 1)?;
                let product = a.checked_mul(b).ok_or(CpuError::Overflow { pc })?;
                self.write_operand(&instr, 2, product)?;
            }

            Opcode::Input => {
                let Some(value) = self.input.pop_front() else {
                    return self.starve(pc);
                };
                self.write_operand(&instr, 0, value)?;
            }

            Opcode::Output => {
                let value = self.read_operand(&instr, 0)?;
                self.output.push(value);
            }

            Opcode::JumpIfTrue | Opcode::JumpIfFalse => {
                let condition = self.read_operand(&instr, 0)?;
                let take = (condition != 0) == (instr.opcode == Opcode::JumpIfTrue);
                if take {
                    let target = self.read_operand(&instr, 1)?;
                    self.regs.jump(target)?;
                    jumped = true;
                }
            }

            Opcode::LessThan => {
                let a = self.read_operand(&instr, 0)?;
                let b = self.read_operand(&instr, 1)?;
                self.write_operand(&instr, 2, Word::from(a < b))?;
            }

            Opcode::Equals => {
                let a = self.read_operand(&instr, 0)?;
                let b = self.read_operand(&instr, 1)?;
                self.write_operand(&instr, 2, Word::from(a == b))?;
            }

            Opcode::AdjustBase => {
                let delta = self.read_operand(&instr, 0)?;
                self.regs.relative_base = self.regs.relative_base
                    .checked_add(delta)
                    .ok_or(CpuError::Overflow { pc })?;
            }

            Opcode::Halt => {
                self.state = MachineState::Halted;
                self.steps += 1;
                self.last_instr = Some(instr);
                debug!(pc, steps = self.steps, "machine halted");
                return Ok(StepOutcome::Halted);
            }
        }

        if !jumped {
            self.regs.advance_pc(instr.width());
        }

        self.state = MachineState::Running;
        self.steps += 1;
        self.last_instr = Some(instr);

        Ok(StepOutcome::Continued)
    }

    fn starve(&mut self, pc: u64) -> Result<StepOutcome, CpuError> {
        match self.config.input_mode {
            InputMode::Interactive => {
                debug!(pc, "awaiting input");
                self.state = MachineState::AwaitingInput;
                Ok(StepOutcome::AwaitingInput)
            }
            InputMode::Hard => Err(CpuError::InputStarvation { pc }),
        }
    }

    /// Resolve parameter `index` of the instruction at `pc`.
    fn resolve(&self, instr: &Instruction, index: usize) -> Result<Target, CpuError> {
        let raw = self.mem.read(self.regs.operand_address(index));
        Ok(instr.modes[index].resolve(raw, &self.regs)?)
    }

    fn read_operand(&self, instr: &Instruction, index: usize) -> Result<Word, CpuError> {
        match self.resolve(instr, index)? {
            Target::Address(addr) => Ok(self.mem.read(addr)),
            Target::Value(value) => Ok(value),
        }
    }

    fn write_operand(&mut self, instr: &Instruction, index: usize, value: Word) -> Result<(), CpuError> {
        match self.resolve(instr, index)? {
            Target::Address(addr) => {
                self.mem.write(addr, value);
                Ok(())
            }
            Target::Value(_) => Err(CpuError::ImmediateWrite { pc: self.regs.pc }),
        }
    }

    /// Decode the instruction at the current pc without executing it.
    pub fn current_instruction(&self) -> Result<Instruction, DecodeError> {
        decode::decode(self.mem.read(self.regs.pc), self.regs.pc)
    }

    /// Value of parameter `index` of the instruction at the current pc,
    /// resolved through its addressing mode.
    pub fn operand(&self, index: usize) -> Result<Word, CpuError> {
        let instr = self.current_instruction()?;
        self.read_operand(&instr, index)
    }

    /// Current execution state.
    pub fn state(&self) -> MachineState {
        self.state
    }

    /// Engine options.
    pub fn config(&self) -> MachineConfig {
        self.config
    }

    /// Output accumulated since the start of the current run.
    pub fn output(&self) -> &[Word] {
        &self.output
    }

    /// Number of input values not yet consumed.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// Program counter.
    pub fn pc(&self) -> u64 {
        self.regs.pc
    }

    /// Relative base register.
    pub fn relative_base(&self) -> Word {
        self.regs.relative_base
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    /// Instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the machine is halted.
    pub fn is_halted(&self) -> bool {
        self.state == MachineState::Halted
    }

    /// Check if the machine is suspended on input.
    pub fn is_awaiting_input(&self) -> bool {
        self.state == MachineState::AwaitingInput
    }

    /// Check if the machine aborted on a fatal error.
    pub fn is_faulted(&self) -> bool {
        self.state == MachineState::Faulted
    }

    /// Check if the machine can still execute instructions.
    pub fn is_running(&self) -> bool {
        !matches!(self.state, MachineState::Halted | MachineState::Faulted)
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("state", &self.state)
            .field("steps", &self.steps)
            .field("regs", &self.regs)
            .field("pending_input", &self.input.len())
            .field("output_len", &self.output.len())
            .field("mem", &self.mem)
            .finish()
    }
}

/// Errors that can occur during execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("machine not running: {0:?}")]
    NotRunning(MachineState),

    #[error("memory error: {0}")]
    MemoryError(#[from] MemoryError),

    #[error("decode error: {0}")]
    DecodeError(#[from] DecodeError),

    #[error("cannot store into immediate-mode parameter at pc {pc}")]
    ImmediateWrite { pc: u64 },

    #[error("input starved at pc {pc}")]
    InputStarvation { pc: u64 },

    #[error("arithmetic overflow at pc {pc}")]
    Overflow { pc: u64 },
}

//! WebAssembly bindings for the Intcode VM.
//!
//! This module provides JavaScript-friendly wrappers around the core machine.

use wasm_bindgen::prelude::*;
use crate::cpu::{Machine, RunOutcome, Word};
use crate::program::{disassemble, disassemble_at, parse_program};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmMachine {
    machine: Machine,
    program: Vec<Word>,
}

#[wasm_bindgen]
impl WasmMachine {
    /// Create an empty machine.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            machine: Machine::new(&[]),
            program: Vec::new(),
        }
    }

    /// Load a program from comma-separated text. Returns its length in words.
    #[wasm_bindgen]
    pub fn load(&mut self, text: &str) -> Result<usize, JsError> {
        let program = parse_program(text)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        let len = program.len();
        self.machine = Machine::new(&program);
        self.program = program;

        Ok(len)
    }

    /// Step one instruction. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        if self.machine.is_halted() {
            return Err(JsError::new("machine is halted"));
        }

        let (text, _) = disassemble_at(self.machine.memory(), self.machine.pc());
        self.machine.step()
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        Ok(text)
    }

    /// Run with a fresh input batch for at most `max_steps` instructions.
    /// Returns the output produced by this call.
    #[wasm_bindgen]
    pub fn run(&mut self, inputs: &[i64], max_steps: u32) -> Result<Vec<i64>, JsError> {
        let outcome = self.machine.run_limited(inputs, max_steps as u64)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        Ok(match outcome {
            RunOutcome::Continued(out) | RunOutcome::Halted(out) | RunOutcome::AwaitingInput(out) => out,
        })
    }

    /// Replace the pending input queue without running.
    #[wasm_bindgen]
    pub fn provide_input(&mut self, inputs: &[i64]) {
        self.machine.provide_input(inputs);
    }

    /// Reset the machine to the loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.machine = Machine::new(&self.program);
    }

    /// Check if the machine is halted.
    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.machine.is_halted()
    }

    /// Check if the machine is waiting for input.
    #[wasm_bindgen]
    pub fn is_awaiting_input(&self) -> bool {
        self.machine.is_awaiting_input()
    }

    /// Get executed instruction count.
    #[wasm_bindgen]
    pub fn steps(&self) -> u64 {
        self.machine.steps()
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> u64 {
        self.machine.pc()
    }

    /// Get relative base.
    #[wasm_bindgen]
    pub fn relative_base(&self) -> i64 {
        self.machine.relative_base()
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.machine.state())
    }

    /// Get the memory cell at an address. Unwritten cells read as zero.
    #[wasm_bindgen]
    pub fn memory_at(&self, addr: u64) -> i64 {
        self.machine.memory().read(addr)
    }

    /// Get the dense memory image from address 0 to the highest written cell.
    /// Fails if a cell far beyond the program has been written.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Result<Vec<i64>, JsError> {
        self.machine.memory().to_vec()
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Get all output not yet cleared by a run call.
    #[wasm_bindgen]
    pub fn output(&self) -> Vec<i64> {
        self.machine.output().to_vec()
    }

    /// Get the full machine state as a JSON string.
    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.machine)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Get the full machine state as a JavaScript object.
    #[wasm_bindgen]
    pub fn state_object(&self) -> Result<JsValue, JsError> {
        let text = self.state_json()?;
        js_sys::JSON::parse(&text)
            .map_err(|_| JsError::new("state is not valid JSON"))
    }
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Disassemble comma-separated program text into a listing.
#[wasm_bindgen]
pub fn wasm_disassemble(text: &str) -> Result<String, JsError> {
    let program = parse_program(text)
        .map_err(|e| JsError::new(&format!("{}", e)))?;
    Ok(disassemble(&program))
}

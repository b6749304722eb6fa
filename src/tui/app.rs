//! Debugger application state and logic.

use crate::cpu::{Machine, MachineState, StepOutcome, Word};
use crate::program::{disassemble_at, parse_program};
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub machine: Machine,
    /// Loaded program, restored on reset.
    pub program: Vec<Word>,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<u64>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// First address shown in the memory view.
    pub mem_scroll: u64,
    /// Input line being typed, if input entry is active.
    pub input_line: Option<String>,
    /// Step past a breakpoint at the current PC on the next tick.
    skip_breakpoint: bool,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<Word>) -> Self {
        Self {
            machine: Machine::new(&program),
            program,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            mem_scroll: 0,
            input_line: None,
            skip_breakpoint: false,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        match self.machine.state() {
            MachineState::Halted | MachineState::Faulted => {
                self.status = format!("Machine stopped: {:?}", self.machine.state());
                self.running = false;
                return;
            }
            _ => {}
        }

        let pc = self.machine.pc();
        let (text, _) = disassemble_at(self.machine.memory(), pc);
        match self.machine.step() {
            Ok(StepOutcome::Continued) => {
                self.status = format!("PC={:04}: {}", pc, text);
            }
            Ok(StepOutcome::Halted) => {
                self.status = format!("Halted after {} steps", self.machine.steps());
                self.running = false;
            }
            Ok(StepOutcome::AwaitingInput) => {
                self.status = format!("PC={:04}: waiting for input, press 'i'", pc);
                self.running = false;
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, input stall, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.skip_breakpoint = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if self.machine.is_halted() || self.machine.is_faulted() {
            self.running = false;
            self.status = format!("Stopped after {} steps", self.machine.steps());
            return;
        }

        let pc = self.machine.pc();
        if self.breakpoints.contains(&pc) && !self.skip_breakpoint {
            self.running = false;
            self.status = format!("Breakpoint at PC={}", pc);
            return;
        }

        self.skip_breakpoint = false;
        self.step();
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.machine.pc();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={}", pc);
        }
    }

    /// Start typing an input line.
    pub fn begin_input(&mut self) {
        self.running = false;
        self.input_line = Some(String::new());
        self.status = "Input: type comma-separated values, Enter to submit, Esc to cancel".into();
    }

    /// Add a character to the input line. Only digits, commas, spaces and
    /// minus signs are accepted.
    pub fn push_input_char(&mut self, c: char) {
        if let Some(line) = self.input_line.as_mut() {
            if c.is_ascii_digit() || matches!(c, ',' | '-' | ' ') {
                line.push(c);
            }
        }
    }

    /// Remove the last character of the input line.
    pub fn pop_input_char(&mut self) {
        if let Some(line) = self.input_line.as_mut() {
            line.pop();
        }
    }

    /// Abandon the input line.
    pub fn cancel_input(&mut self) {
        self.input_line = None;
        self.status = "Input cancelled.".into();
    }

    /// Parse the input line and hand it to the machine as its new queue.
    pub fn submit_input(&mut self) {
        let Some(line) = self.input_line.take() else {
            return;
        };

        match parse_program(&line) {
            Ok(values) => {
                self.machine.provide_input(&values);
                self.status = format!("Queued {} input value(s)", values.len());
            }
            Err(e) => {
                self.status = format!("Bad input: {}", e);
            }
        }
    }

    /// Reset the machine to the loaded program.
    pub fn reset(&mut self) {
        self.machine = Machine::new(&self.program);
        self.running = false;
        self.input_line = None;
        self.status = "Reset. Ready.".into();
    }

    /// Scroll the memory view.
    pub fn scroll_memory(&mut self, delta: i64) {
        self.mem_scroll = self.mem_scroll.saturating_add_signed(delta);
    }

    /// Disassembly starting a little before the current PC.
    ///
    /// Decoding runs forward from the program start where possible so
    /// that the lines stay aligned on instruction boundaries.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u64, String, bool)> {
        let pc = self.machine.pc();
        let mem = self.machine.memory();

        let mut addrs = Vec::new();
        let mut addr = 0u64;
        let scan_end = if pc <= self.program.len() as u64 { pc } else { 0 };
        while addr < scan_end {
            addrs.push(addr);
            let (_, width) = disassemble_at(mem, addr);
            addr += width;
        }
        // A jump into the middle of an instruction leaves `addr` past pc.
        let before = lines / 3;
        let mut start = addrs.len().saturating_sub(before);
        if addr != scan_end {
            start = addrs.len();
        }
        let mut listing: Vec<u64> = addrs.split_off(start);

        let mut addr = pc;
        while listing.len() < lines {
            listing.push(addr);
            let (_, width) = disassemble_at(mem, addr);
            addr += width;
        }

        listing
            .into_iter()
            .map(|a| {
                let (text, _) = disassemble_at(mem, a);
                (a, text, a == pc)
            })
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<Word>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if app.input_line.is_some() {
                        match key.code {
                            KeyCode::Enter => app.submit_input(),
                            KeyCode::Esc => app.cancel_input(),
                            KeyCode::Backspace => app.pop_input_char(),
                            KeyCode::Char(c) => app.push_input_char(c),
                            _ => {}
                        }
                    } else {
                        match key.code {
                            KeyCode::Char('q') => app.should_quit = true,
                            KeyCode::Char('s') => {
                                app.running = false;
                                app.step();
                            }
                            KeyCode::Char('r') => app.run(),
                            KeyCode::Char('p') => {
                                app.running = false;
                                app.status = "Paused.".into();
                            }
                            KeyCode::Char('b') => app.toggle_breakpoint(),
                            KeyCode::Char('i') => app.begin_input(),
                            KeyCode::Char('x') => app.reset(),
                            KeyCode::Up => app.scroll_memory(-1),
                            KeyCode::Down => app.scroll_memory(1),
                            KeyCode::PageUp => app.scroll_memory(-16),
                            KeyCode::PageDown => app.scroll_memory(16),
                            _ => {}
                        }
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

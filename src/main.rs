//! Intcode VM - CLI Entry Point
//!
//! Commands:
//! - `intcode-vm run <program>` - Run a program, prompting for input when it stalls
//! - `intcode-vm amplify <program>` - Drive an amplifier chain or feedback ring
//! - `intcode-vm disasm <program>` - Disassemble a program
//! - `intcode-vm debug <program>` - Interactive debugger
//! - `intcode-vm test` - Run the self-test battery

use clap::{Parser, Subcommand};
use intcode::{Machine, MachineConfig, InputMode, RunOutcome, Word};
use std::io::{BufRead, Write};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "intcode-vm")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "A stored-program Intcode virtual machine")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the comma-separated program file
        program: String,
        /// Initial input values (comma-separated)
        #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
        input: Vec<Word>,
        /// Maximum number of instructions per run call
        #[arg(short, long)]
        max_steps: Option<u64>,
        /// Log every executed instruction
        #[arg(short, long)]
        trace: bool,
        /// Treat input starvation as an error instead of prompting
        #[arg(long)]
        hard: bool,
        /// Print the final machine state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run an amplifier network over one program
    Amplify {
        /// Path to the comma-separated program file
        program: String,
        /// Phase settings, one per stage (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true, allow_negative_numbers = true)]
        phases: Vec<Word>,
        /// Wire the stages into a feedback ring
        #[arg(short, long)]
        feedback: bool,
        /// Try every ordering of the phases and report the best
        #[arg(short, long)]
        search: bool,
    },
    /// Disassemble a program to readable text
    Disasm {
        /// Path to the comma-separated program file
        program: String,
    },
    /// Interactive debugger
    #[cfg(feature = "tui")]
    Debug {
        /// Path to the comma-separated program file
        program: String,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();

    let trace = matches!(cli.command, Some(Commands::Run { trace: true, .. }));
    init_logging(cli.verbose, trace);

    match cli.command {
        Some(Commands::Run { program, input, max_steps, hard, json, .. }) => {
            let input_mode = if hard { InputMode::Hard } else { InputMode::Interactive };
            run_program(&program, &input, max_steps, MachineConfig { input_mode }, json);
        }
        Some(Commands::Amplify { program, phases, feedback, search }) => {
            amplify(&program, &phases, feedback, search);
        }
        Some(Commands::Disasm { program }) => {
            disassemble_file(&program);
        }
        #[cfg(feature = "tui")]
        Some(Commands::Debug { program }) => {
            debug_program(&program);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("Intcode VM v0.1.0");
            println!("A stored-program virtual machine");
            println!();
            println!("Use --help for available commands");
            println!();
            demo_quine();
        }
    }
}

fn init_logging(verbose: u8, trace: bool) {
    let default = if trace {
        "intcode=trace"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_or_exit(path: &str) -> Vec<Word> {
    match intcode::load_program(path) {
        Ok(words) if words.is_empty() => {
            eprintln!("❌ Program is empty");
            std::process::exit(1);
        }
        Ok(words) => words,
        Err(e) => {
            eprintln!("❌ Failed to load program: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_program(
    path: &str,
    inputs: &[Word],
    max_steps: Option<u64>,
    config: MachineConfig,
    json: bool,
) {
    println!("🔧 Running: {}", path);

    let program = load_or_exit(path);
    println!("📂 Loaded {} words", program.len());

    let mut machine = Machine::with_config(&program, config);

    println!();
    println!("━━━ Execution ━━━");

    let mut batch = inputs.to_vec();
    let stdin = std::io::stdin();
    loop {
        let result = match max_steps {
            Some(limit) => machine.run_limited(&batch, limit),
            None => machine.run(&batch),
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("❌ Machine error at pc={}: {}", machine.pc(), e);
                std::process::exit(1);
            }
        };

        print_output(outcome.output());

        match outcome {
            RunOutcome::AwaitingInput(_) => {
                print!("input> ");
                let _ = std::io::stdout().flush();

                let mut line = String::new();
                match stdin.lock().read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                batch = match intcode::parse_program(&line) {
                    Ok(values) => values,
                    Err(e) => {
                        eprintln!("❌ Bad input: {}", e);
                        Vec::new()
                    }
                };
            }
            RunOutcome::Continued(_) => {
                println!();
                println!("⚠️  Reached max steps limit. Use --max-steps to increase.");
                break;
            }
            RunOutcome::Halted(_) => break,
        }
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Steps: {}", machine.steps());
    println!("State: {:?}", machine.state());
    println!("PC:            {}", machine.pc());
    println!("Relative base: {}", machine.relative_base());
    println!("Memory cells:  {}", machine.memory().len());

    if json {
        match serde_json::to_string_pretty(&machine) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("❌ Failed to serialize state: {}", e),
        }
    }
}

fn print_output(output: &[Word]) {
    if output.is_empty() {
        return;
    }

    // Programs that draw ASCII art emit printable characters.
    let printable = output.iter().all(|&w| w == 10 || (32..127).contains(&w));
    if printable && output.len() > 1 {
        let text: String = output.iter().map(|&w| w as u8 as char).collect();
        print!("{}", text);
        if !text.ends_with('\n') {
            println!();
        }
    } else {
        let values: Vec<String> = output.iter().map(|w| w.to_string()).collect();
        println!("{}", values.join(", "));
    }
}

fn amplify(path: &str, phases: &[Word], feedback: bool, search: bool) {
    use intcode::AmplifierNetwork;

    let program = load_or_exit(path);
    let network = AmplifierNetwork::new(&program);
    let topology = if feedback { "feedback ring" } else { "series" };

    println!("🔧 {} stages, {}", phases.len(), topology);

    let result = match (feedback, search) {
        (false, false) => network.run_series(phases).map(|s| (s, phases.to_vec())),
        (true, false) => network.run_feedback(phases).map(|s| (s, phases.to_vec())),
        (false, true) => network.best_series(phases),
        (true, true) => network.best_feedback(phases),
    };

    match result {
        Ok((signal, order)) => {
            let order: Vec<String> = order.iter().map(|p| p.to_string()).collect();
            println!("Phases: {}", order.join(","));
            println!("Signal: {}", signal);
        }
        Err(e) => {
            eprintln!("❌ Network error: {}", e);
            std::process::exit(1);
        }
    }
}

fn disassemble_file(path: &str) {
    println!("📖 Disassembling: {}", path);
    println!();

    let program = load_or_exit(path);
    println!("{}", intcode::disassemble(&program));
}

#[cfg(feature = "tui")]
fn debug_program(path: &str) {
    use intcode::tui::run_debugger;

    println!("🔍 Loading: {}", path);
    let program = load_or_exit(path);

    println!("🚀 Launching debugger...");
    println!();

    if let Err(e) = run_debugger(program) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

fn demo_quine() {
    use intcode::harness::QUINE;

    println!("━━━ Quine Demo ━━━");
    println!();

    let mut machine = Machine::new(&QUINE);
    match machine.run(&[]) {
        Ok(outcome) => {
            let text: Vec<String> = outcome.output().iter().map(|w| w.to_string()).collect();
            println!("Program: {}", intcode::format_program(&QUINE));
            println!("Output:  {}", text.join(","));
            println!("Steps:   {}", machine.steps());
        }
        Err(e) => eprintln!("❌ {}", e),
    }
}

fn run_self_test() {
    use intcode::harness::run_battery;

    println!("━━━ Intcode Self-Test ━━━");
    println!();

    let report = run_battery();
    for (name, result) in &report.results {
        match result {
            Ok(()) => println!("{}... ✓", name),
            Err(e) => println!("{}... ✗ ({})", name, e),
        }
    }

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", report.passed(), report.failed());

    if report.all_passed() {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}

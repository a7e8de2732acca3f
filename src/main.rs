use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use log::info;

use intcode::amplifier::{self, AMPLIFIERS, Phases};
use intcode::channel::{Input, Output};
use intcode::disasm::disassemble;
use intcode::gravity;
use intcode::machine::{Machine, MachineConfig};
use intcode::tape::Tape;

#[derive(Parser)]
#[command(name = "intcode", version, about = "Intcode virtual machine and amplifier chain")]
struct Cli {
    /// Disable the relative base register (opcode 9 and addressing mode 2).
    #[arg(long, global = true)]
    legacy: bool,

    /// Fault any machine that executes more than this many instructions.
    #[arg(long, global = true)]
    step_limit: Option<usize>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program. Without --input values, input is read from the console.
    Run {
        /// Program source: comma-separated integers.
        path: PathBuf,

        /// Values to queue as input, e.g. --input 1,-2,3.
        #[arg(long = "input", value_delimiter = ',', allow_hyphen_values = true)]
        inputs: Vec<i64>,
    },

    /// Compute the thruster signal of the five-amplifier chain.
    Amplify {
        path: PathBuf,

        /// Phase settings to try, e.g. 4,3,2,1,0. Without them, all 120
        /// settings are searched for the best signal.
        #[arg(long, value_delimiter = ',')]
        phases: Option<Vec<i64>>,
    },

    /// Restore a noun and verb into cells 1 and 2 and report cell 0.
    Gravity {
        path: PathBuf,

        #[arg(long, default_value_t = 12)]
        noun: i64,

        #[arg(long, default_value_t = 2)]
        verb: i64,

        /// Search for the noun and verb that produce this value.
        #[arg(long)]
        target: Option<i64>,
    },

    /// Print a disassembly of the program.
    Disasm { path: PathBuf },
}

fn load(path: &Path) -> Result<Tape> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read program {}", path.display()))?;
    let tape = Tape::load(&source)
        .with_context(|| format!("failed to parse program {}", path.display()))?;
    info!("loaded {} cells from {}", tape.len(), path.display());
    Ok(tape)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    let config = MachineConfig {
        relative_base: !cli.legacy,
        step_limit: cli.step_limit,
    };

    match cli.command {
        Command::Run { path, inputs } => {
            let tape = load(&path)?;
            // Faults are recorded in the machine's status, which is reported
            // either way.
            if inputs.is_empty() {
                let mut machine = Machine::console(tape, config);
                let _ = machine.run();
                report(&machine);
            } else {
                let mut machine = Machine::new(tape, config);
                for value in inputs {
                    machine.input().push(value);
                }
                let _ = machine.run();
                for value in machine.output().drain() {
                    println!("{value}");
                }
                report(&machine);
            }
        }
        Command::Amplify { path, phases } => {
            let tape = load(&path)?;
            match phases {
                Some(phases) => {
                    let phases: Phases = phases.try_into().map_err(|given: Vec<i64>| {
                        anyhow!("expected {AMPLIFIERS} phase settings, got {}", given.len())
                    })?;
                    let signal = amplifier::thruster_signal(&tape, &phases, config)?;
                    println!("The thruster signal for phases {phases:?} is {signal}.");
                }
                None => {
                    let best = amplifier::best_signal(&tape, config)?;
                    println!(
                        "The best possible thruster output is {} (phases {:?}).",
                        best.signal, best.phases
                    );
                }
            }
        }
        Command::Gravity {
            path,
            noun,
            verb,
            target,
        } => {
            let tape = load(&path)?;
            let value = gravity::run_with(&tape, noun, verb, config)
                .with_context(|| format!("program faulted with noun {noun} and verb {verb}"))?;
            println!(
                "Cell 0 with input {} is {value}.",
                gravity::answer(noun, verb)
            );
            if let Some(target) = target {
                let Some((noun, verb)) = gravity::find_noun_verb(&tape, target, config) else {
                    bail!("no noun and verb in 0..={} produce {target}", gravity::MAX_INPUT);
                };
                println!(
                    "Output {target} produced with noun {noun} and verb {verb} (answer {}).",
                    gravity::answer(noun, verb)
                );
            }
        }
        Command::Disasm { path } => {
            let tape = load(&path)?;
            print!("{}", disassemble(tape.cells()));
        }
    }

    Ok(())
}

fn report<I: Input, O: Output>(machine: &Machine<I, O>) {
    println!(
        "Program exited after {} steps with status {}.",
        machine.steps(),
        machine.status()
    );
}

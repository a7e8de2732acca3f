use std::fmt;
use std::io::{BufReader, Stdin, Stdout};

use log::{debug, trace, warn};
use thiserror::Error;

use crate::channel::{ChannelError, ConsoleInput, ConsoleOutput, Input, Output, Queue};
use crate::decode::{Mode, Opcode, addressing_mode, opcode};
use crate::tape::{Tape, TapeError};

/// Configuration for a single machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    /// Enable the relative base register: opcode 9 and addressing mode 2.
    /// Without it the machine behaves like the earlier, position/immediate
    /// only revisions, and rejects both.
    pub relative_base: bool,
    /// Maximum number of instructions to execute before faulting. `None`
    /// runs until the program halts or faults.
    pub step_limit: Option<usize>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            relative_base: true,
            step_limit: None,
        }
    }
}

impl MachineConfig {
    /// The position/immediate only revision of the machine.
    pub fn legacy() -> Self {
        Self {
            relative_base: false,
            ..Self::default()
        }
    }
}

/// Why a machine entered the error state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error(transparent)]
    Tape(#[from] TapeError),
    #[error("unknown opcode {opcode} in instruction {instruction} at address {address}")]
    UnknownOpcode {
        opcode: i64,
        instruction: i64,
        address: i64,
    },
    #[error("unknown addressing mode {mode} for parameter {param} of instruction {instruction} at address {address}")]
    UnknownAddressingMode {
        mode: i64,
        param: usize,
        instruction: i64,
        address: i64,
    },
    #[error("parameter {param} of instruction {instruction} at address {address} is a destination and cannot be {mode:?}")]
    InvalidDestinationMode {
        mode: Mode,
        param: usize,
        instruction: i64,
        address: i64,
    },
    #[error("input requested at address {address}, but the input channel is empty")]
    InputExhausted { address: i64 },
    #[error("channel failed at address {address}: {source}")]
    Channel { address: i64, source: ChannelError },
    #[error("step limit of {0} instructions exhausted")]
    StepLimit(usize),
}

/// Execution status. `Running` is initial; the other two are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Running,
    Complete,
    Error(Fault),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Running => write!(f, "RUNNING"),
            Status::Complete => write!(f, "COMPLETE"),
            Status::Error(fault) => write!(f, "ERROR ({fault})"),
        }
    }
}

/// What an executed instruction asks of the run loop.
enum Flow {
    Continue,
    Halt,
}

/// One interpreter: a tape plus the registers and channels that execute it.
///
/// The machine owns its tape. Chained machines share data only through the
/// queues handed to them as channels.
pub struct Machine<I = Queue, O = Queue> {
    tape: Tape,
    pointer: i64,
    relative_base: i64,
    status: Status,
    input: I,
    output: O,
    config: MachineConfig,
    steps: usize,
    emitted: usize,
    last_output: Option<i64>,
}

impl Machine<Queue, Queue> {
    /// A machine with fresh, empty input and output queues.
    pub fn new(tape: Tape, config: MachineConfig) -> Self {
        Self::with_channels(tape, config, Queue::new(), Queue::new())
    }
}

impl Machine<ConsoleInput<BufReader<Stdin>, Stdout>, ConsoleOutput<Stdout>> {
    /// A machine that prompts on stdin for input and prints its output.
    pub fn console(tape: Tape, config: MachineConfig) -> Self {
        Self::with_channels(tape, config, ConsoleInput::stdio(), ConsoleOutput::stdio())
    }
}

impl<I: Input, O: Output> Machine<I, O> {
    pub fn with_channels(tape: Tape, config: MachineConfig, input: I, output: O) -> Self {
        Self {
            tape,
            pointer: 0,
            relative_base: 0,
            status: Status::Running,
            input,
            output,
            config,
            steps: 0,
            emitted: 0,
            last_output: None,
        }
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn into_tape(self) -> Tape {
        self.tape
    }

    pub fn pointer(&self) -> i64 {
        self.pointer
    }

    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Number of instructions executed so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of values written to the output channel so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// The most recent value written to the output channel.
    pub fn last_output(&self) -> Option<i64> {
        self.last_output
    }

    /// Execute one instruction.
    ///
    /// Does nothing once the machine has left `Running`. A fault moves the
    /// machine to `Error` and is reported through the returned status.
    pub fn tick(&mut self) -> &Status {
        if !self.is_running() {
            return &self.status;
        }
        if let Some(limit) = self.config.step_limit {
            if self.steps >= limit {
                return self.fail(Fault::StepLimit(limit));
            }
        }
        self.steps += 1;

        match self.step() {
            Ok(Flow::Continue) => {}
            Ok(Flow::Halt) => {
                debug!("halted after {} steps", self.steps);
                self.status = Status::Complete;
            }
            Err(fault) => {
                return self.fail(fault);
            }
        }
        &self.status
    }

    /// Tick until the machine leaves `Running`.
    pub fn run(&mut self) -> Result<(), Fault> {
        while self.is_running() {
            self.tick();
        }
        match &self.status {
            Status::Error(fault) => Err(fault.clone()),
            _ => Ok(()),
        }
    }

    fn fail(&mut self, fault: Fault) -> &Status {
        warn!("machine faulted after {} steps: {fault}", self.steps);
        self.status = Status::Error(fault);
        &self.status
    }

    fn step(&mut self) -> Result<Flow, Fault> {
        let address = self.pointer;
        let instruction = self.fetch()?;
        let code = opcode(instruction);
        let op = Opcode::from_code(code)
            .filter(|op| self.config.relative_base || !op.needs_relative_base())
            .ok_or(Fault::UnknownOpcode {
                opcode: code,
                instruction,
                address,
            })?;
        debug!("{address:>6}: {instruction} {}", op.mnemonic());

        let ins = Decoded {
            address,
            instruction,
        };
        match op {
            Opcode::Add => {
                let a = self.load(&ins, 1)?;
                let b = self.load(&ins, 2)?;
                let dest = self.destination(&ins, 3)?;
                self.tape.set(dest, a.wrapping_add(b))?;
            }
            Opcode::Multiply => {
                let a = self.load(&ins, 1)?;
                let b = self.load(&ins, 2)?;
                let dest = self.destination(&ins, 3)?;
                self.tape.set(dest, a.wrapping_mul(b))?;
            }
            Opcode::Input => {
                let dest = self.destination(&ins, 1)?;
                let value = self.input.read().map_err(|err| match err {
                    ChannelError::Exhausted => Fault::InputExhausted { address },
                    source => Fault::Channel { address, source },
                })?;
                trace!("input {value} -> [{dest}]");
                self.tape.set(dest, value)?;
            }
            Opcode::Output => {
                let value = self.load(&ins, 1)?;
                self.output
                    .write(value)
                    .map_err(|source| Fault::Channel { address, source })?;
                self.emitted += 1;
                self.last_output = Some(value);
            }
            Opcode::JumpIfTrue => {
                let condition = self.load(&ins, 1)?;
                let target = self.load(&ins, 2)?;
                if condition != 0 {
                    trace!("jump -> {target}");
                    self.pointer = target;
                }
            }
            Opcode::JumpIfFalse => {
                let condition = self.load(&ins, 1)?;
                let target = self.load(&ins, 2)?;
                if condition == 0 {
                    trace!("jump -> {target}");
                    self.pointer = target;
                }
            }
            Opcode::LessThan => {
                let a = self.load(&ins, 1)?;
                let b = self.load(&ins, 2)?;
                let dest = self.destination(&ins, 3)?;
                self.tape.set(dest, i64::from(a < b))?;
            }
            Opcode::Equals => {
                let a = self.load(&ins, 1)?;
                let b = self.load(&ins, 2)?;
                let dest = self.destination(&ins, 3)?;
                self.tape.set(dest, i64::from(a == b))?;
            }
            Opcode::AdjustRelativeBase => {
                let offset = self.load(&ins, 1)?;
                self.relative_base = self.relative_base.wrapping_add(offset);
                trace!("relative base -> {}", self.relative_base);
            }
            Opcode::Halt => return Ok(Flow::Halt),
        }
        Ok(Flow::Continue)
    }

    /// Read the cell under the pointer and advance past it.
    fn fetch(&mut self) -> Result<i64, Fault> {
        let value = self.tape.get(self.pointer)?;
        self.pointer += 1;
        Ok(value)
    }

    fn mode(&self, ins: &Decoded, param: usize) -> Result<Mode, Fault> {
        let digit = addressing_mode(ins.instruction, param);
        Mode::from_digit(digit)
            .filter(|&mode| self.config.relative_base || mode != Mode::Relative)
            .ok_or(Fault::UnknownAddressingMode {
                mode: digit,
                param,
                instruction: ins.instruction,
                address: ins.address,
            })
    }

    /// Fetch the next operand and resolve it to a value.
    fn load(&mut self, ins: &Decoded, param: usize) -> Result<i64, Fault> {
        let raw = self.fetch()?;
        let value = match self.mode(ins, param)? {
            Mode::Position => self.tape.get(raw)?,
            Mode::Immediate => raw,
            Mode::Relative => self.tape.get(self.relative_base.wrapping_add(raw))?,
        };
        trace!("param {param}: {raw} -> {value}");
        Ok(value)
    }

    /// Fetch the next operand and resolve it to a write address.
    fn destination(&mut self, ins: &Decoded, param: usize) -> Result<i64, Fault> {
        let raw = self.fetch()?;
        match self.mode(ins, param)? {
            Mode::Position => Ok(raw),
            Mode::Relative => Ok(self.relative_base.wrapping_add(raw)),
            mode @ Mode::Immediate => Err(Fault::InvalidDestinationMode {
                mode,
                param,
                instruction: ins.instruction,
                address: ins.address,
            }),
        }
    }
}

/// The instruction currently executing, for operand decoding and faults.
struct Decoded {
    address: i64,
    instruction: i64,
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn cell() -> impl Strategy<Value = i64> {
        prop_oneof![
            4 => 0i64..120,
            2 => prop::sample::select(vec![1i64, 2, 3, 4, 5, 6, 7, 8, 9, 99, 101, 1001, 1101, 204, 109, 21101]),
            1 => -20i64..0,
        ]
    }

    proptest! {
        #[test]
        fn arbitrary_tapes_never_panic(
            cells in prop::collection::vec(cell(), 1..64),
            inputs in prop::collection::vec(-50i64..50, 0..8),
        ) {
            let config = MachineConfig { step_limit: Some(500), ..MachineConfig::default() };
            let mut m = Machine::new(Tape::new(cells), config);
            for value in inputs {
                m.input().push(value);
            }
            let _ = m.run();
            prop_assert!(!m.is_running());
            prop_assert!(m.steps() <= 500);
        }

        #[test]
        fn tape_never_shrinks_during_execution(
            cells in prop::collection::vec(cell(), 1..64),
        ) {
            let original = cells.len();
            let config = MachineConfig { step_limit: Some(200), ..MachineConfig::default() };
            let mut m = Machine::new(Tape::new(cells), config);
            while m.is_running() {
                let before = m.tape().len();
                m.tick();
                prop_assert!(m.tape().len() >= before);
            }
            prop_assert!(m.tape().len() >= original);
        }
    }
}

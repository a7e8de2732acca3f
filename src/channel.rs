use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::rc::Rc;

use thiserror::Error;

/// Errors raised by an I/O channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// A read was requested but nothing is queued. Channels never block.
    #[error("input channel is empty")]
    Exhausted,
    /// The console reached end of input.
    #[error("console input closed")]
    Closed,
    #[error("console I/O failed: {0}")]
    Io(String),
}

impl From<io::Error> for ChannelError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Where a machine's INPUT instruction takes values from.
pub trait Input {
    fn read(&mut self) -> Result<i64, ChannelError>;
}

/// Where a machine's OUTPUT instruction sends values.
pub trait Output {
    fn write(&mut self, value: i64) -> Result<(), ChannelError>;
}

/// A FIFO of integers.
///
/// Cloning a `Queue` yields another handle to the same buffer, which is how
/// two machines share one: the upstream machine holds it as its output and
/// the downstream machine holds it as its input.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    values: Rc<RefCell<VecDeque<i64>>>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, value: i64) {
        self.values.borrow_mut().push_back(value);
    }

    /// Remove and return the oldest value.
    pub fn pop(&self) -> Option<i64> {
        self.values.borrow_mut().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    /// Remove every queued value, oldest first.
    pub fn drain(&self) -> Vec<i64> {
        self.values.borrow_mut().drain(..).collect()
    }

    /// Whether `other` is a handle to the same buffer.
    pub fn shares_with(&self, other: &Queue) -> bool {
        Rc::ptr_eq(&self.values, &other.values)
    }
}

impl FromIterator<i64> for Queue {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self {
            values: Rc::new(RefCell::new(iter.into_iter().collect())),
        }
    }
}

impl Input for Queue {
    fn read(&mut self) -> Result<i64, ChannelError> {
        self.pop().ok_or(ChannelError::Exhausted)
    }
}

impl Output for Queue {
    fn write(&mut self, value: i64) -> Result<(), ChannelError> {
        self.push(value);
        Ok(())
    }
}

/// Interactive input: prompts on `writer` and reads one integer per line
/// from `reader`, prompting again until a line parses.
pub struct ConsoleInput<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> ConsoleInput<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl ConsoleInput<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> Input for ConsoleInput<R, W> {
    fn read(&mut self) -> Result<i64, ChannelError> {
        write!(self.writer, "Program requests input: ")?;
        self.writer.flush()?;
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(ChannelError::Closed);
            }
            match line.trim().parse::<i64>() {
                Ok(value) => return Ok(value),
                Err(_) => {
                    write!(self.writer, "No value received. Try again: ")?;
                    self.writer.flush()?;
                }
            }
        }
    }
}

/// Console output: prints each value on its own line.
pub struct ConsoleOutput<W> {
    writer: W,
}

impl<W: Write> ConsoleOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl ConsoleOutput<Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Output for ConsoleOutput<W> {
    fn write(&mut self, value: i64) -> Result<(), ChannelError> {
        writeln!(self.writer, "Program outputted a value: {value}")?;
        Ok(())
    }
}

use std::num::ParseIntError;
use std::str::FromStr;

use thiserror::Error;

/// Largest extent a tape may grow to, in cells.
///
/// Addresses are ordinary integers, so a program can compute an address far
/// beyond anything it will ever use. Growing to it would abort the process on
/// allocation; instead the access faults.
pub const MAX_CELLS: usize = 1 << 24;

/// Errors raised by addressed tape accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TapeError {
    #[error("attempt to access negative tape index {0}")]
    NegativeIndex(i64),
    #[error("tape index {0} is beyond the maximum tape extent")]
    OutOfRange(i64),
}

/// Errors raised while parsing program source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("cell {cell}: invalid integer {token:?}: {source}")]
    Integer {
        cell: usize,
        token: String,
        source: ParseIntError,
    },
    #[error("cell {cell}: empty value between commas")]
    Empty { cell: usize },
}

/// The machine's sole memory: a growable sequence of signed cells.
///
/// Any index that is read or written is backed by a zero-initialized cell.
/// The tape grows to cover the highest index touched and never shrinks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<i64>,
}

impl Tape {
    pub fn new(cells: Vec<i64>) -> Self {
        Self { cells }
    }

    /// Parse comma-separated decimal integers.
    ///
    /// Surrounding whitespace and a single dangling comma after the final
    /// value are tolerated. Anything else that is not an integer is an error.
    pub fn load(source: &str) -> Result<Self, ParseError> {
        let source = source.trim();
        if source.is_empty() {
            return Ok(Self::default());
        }
        let source = source.strip_suffix(',').unwrap_or(source);

        let mut cells = Vec::new();
        for (cell, token) in source.split(',').enumerate() {
            let token = token.trim();
            if token.is_empty() {
                return Err(ParseError::Empty { cell });
            }
            let value = token.parse::<i64>().map_err(|source| ParseError::Integer {
                cell,
                token: token.to_string(),
                source,
            })?;
            cells.push(value);
        }
        Ok(Self { cells })
    }

    /// Read the cell at `index`, growing the tape with zeros if needed.
    pub fn get(&mut self, index: i64) -> Result<i64, TapeError> {
        let i = self.ensure(index)?;
        Ok(self.cells[i])
    }

    /// Store `value` at `index`, growing the tape with zeros if needed.
    pub fn set(&mut self, index: i64, value: i64) -> Result<(), TapeError> {
        let i = self.ensure(index)?;
        self.cells[i] = value;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[i64] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<i64> {
        self.cells
    }

    /// Validate `index` and grow the tape so that it is backed.
    ///
    /// `Vec::resize` reserves with amortized doubling, so repeated growth by
    /// one cell stays linear overall.
    fn ensure(&mut self, index: i64) -> Result<usize, TapeError> {
        let i = usize::try_from(index).map_err(|_| TapeError::NegativeIndex(index))?;
        if i >= MAX_CELLS {
            return Err(TapeError::OutOfRange(index));
        }
        if i >= self.cells.len() {
            self.cells.resize(i + 1, 0);
        }
        Ok(i)
    }
}

impl FromStr for Tape {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::load(s)
    }
}

impl From<Vec<i64>> for Tape {
    fn from(cells: Vec<i64>) -> Self {
        Self::new(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_simple() {
        let tape = Tape::load("1,9,10,3,2,3,11,0,99,30,40,50").unwrap();
        assert_eq!(tape.cells(), &[1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50]);
    }

    #[test]
    fn test_load_trailing_newline_and_negatives() {
        let tape = Tape::load("1101,100,-1,4,0\n").unwrap();
        assert_eq!(tape.cells(), &[1101, 100, -1, 4, 0]);
    }

    #[test]
    fn test_load_dangling_comma() {
        let tape = Tape::load("3,0,4,0,99,\n").unwrap();
        assert_eq!(tape.cells(), &[3, 0, 4, 0, 99]);
    }

    #[test]
    fn test_load_empty_source() {
        let tape = Tape::load("  \n").unwrap();
        assert!(tape.is_empty());
    }

    #[test]
    fn test_load_full_width_literal() {
        let tape = Tape::load("104,1125899906842624,99").unwrap();
        assert_eq!(tape.cells()[1], 1125899906842624);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let err = Tape::load("1,2,x,4").unwrap_err();
        assert!(matches!(err, ParseError::Integer { cell: 2, .. }));
    }

    #[test]
    fn test_load_rejects_inner_empty() {
        let err = Tape::load("1,,2").unwrap_err();
        assert_eq!(err, ParseError::Empty { cell: 1 });
    }

    #[test]
    fn test_get_beyond_extent_grows_with_zero() {
        let mut tape = Tape::new(vec![1, 2, 3]);
        assert_eq!(tape.get(10).unwrap(), 0);
        assert_eq!(tape.len(), 11);
        assert_eq!(&tape.cells()[..3], &[1, 2, 3]);
        assert!(tape.cells()[3..].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_set_beyond_extent_grows() {
        let mut tape = Tape::new(vec![7]);
        tape.set(5, 42).unwrap();
        assert_eq!(tape.cells(), &[7, 0, 0, 0, 0, 42]);
    }

    #[test]
    fn test_negative_index_is_error_not_growth() {
        let mut tape = Tape::new(vec![1, 2]);
        assert_eq!(tape.get(-1), Err(TapeError::NegativeIndex(-1)));
        assert_eq!(tape.set(-3, 9), Err(TapeError::NegativeIndex(-3)));
        assert_eq!(tape.len(), 2);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut tape = Tape::default();
        let far = MAX_CELLS as i64;
        assert_eq!(tape.get(far), Err(TapeError::OutOfRange(far)));
        assert!(tape.is_empty());
    }
}

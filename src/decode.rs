//! Instruction decoding.
//!
//! An instruction is a single tape cell. Its low two decimal digits select
//! the operation; each higher digit, from the hundreds place up, is the
//! addressing mode of one parameter:
//!
//!   ABCDE
//!    1002
//!
//!   DE = 02  multiply
//!   C  = 0   parameter 1 in position mode
//!   B  = 1   parameter 2 in immediate mode
//!   A  = 0   parameter 3 in position mode (leading zero omitted)
//!
//! Decoding is recomputed on every fetch; nothing is cached, since programs
//! are free to rewrite their own instructions.

/// The operations of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Multiply,
    Input,
    Output,
    JumpIfTrue,
    JumpIfFalse,
    LessThan,
    Equals,
    AdjustRelativeBase,
    Halt,
}

impl Opcode {
    /// Map a numeric opcode to its operation, if it names one.
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            1 => Self::Add,
            2 => Self::Multiply,
            3 => Self::Input,
            4 => Self::Output,
            5 => Self::JumpIfTrue,
            6 => Self::JumpIfFalse,
            7 => Self::LessThan,
            8 => Self::Equals,
            9 => Self::AdjustRelativeBase,
            99 => Self::Halt,
            _ => return None,
        })
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Add => 1,
            Self::Multiply => 2,
            Self::Input => 3,
            Self::Output => 4,
            Self::JumpIfTrue => 5,
            Self::JumpIfFalse => 6,
            Self::LessThan => 7,
            Self::Equals => 8,
            Self::AdjustRelativeBase => 9,
            Self::Halt => 99,
        }
    }

    /// Number of parameters following the instruction cell.
    pub fn arity(self) -> usize {
        match self {
            Self::Add | Self::Multiply | Self::LessThan | Self::Equals => 3,
            Self::JumpIfTrue | Self::JumpIfFalse => 2,
            Self::Input | Self::Output | Self::AdjustRelativeBase => 1,
            Self::Halt => 0,
        }
    }

    /// The 1-based index of the parameter this operation writes to, if any.
    pub fn destination(self) -> Option<usize> {
        match self {
            Self::Add | Self::Multiply | Self::LessThan | Self::Equals => Some(3),
            Self::Input => Some(1),
            _ => None,
        }
    }

    /// Whether the operation only exists on machines with a relative base.
    pub fn needs_relative_base(self) -> bool {
        matches!(self, Self::AdjustRelativeBase)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Multiply => "MUL",
            Self::Input => "IN",
            Self::Output => "OUT",
            Self::JumpIfTrue => "JNZ",
            Self::JumpIfFalse => "JZ",
            Self::LessThan => "LT",
            Self::Equals => "EQ",
            Self::AdjustRelativeBase => "ARB",
            Self::Halt => "HALT",
        }
    }
}

/// How a parameter's raw operand is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// The operand is an address to dereference.
    Position,
    /// The operand is the value itself.
    Immediate,
    /// The operand plus the relative base is an address to dereference.
    Relative,
}

impl Mode {
    pub fn from_digit(digit: i64) -> Option<Self> {
        match digit {
            0 => Some(Self::Position),
            1 => Some(Self::Immediate),
            2 => Some(Self::Relative),
            _ => None,
        }
    }
}

/// The numeric opcode of an instruction: its value mod 100.
///
/// Uses truncating remainder, so a negative instruction yields a negative
/// opcode, which no operation claims.
pub fn opcode(instruction: i64) -> i64 {
    instruction % 100
}

/// The raw mode digit of the 1-based parameter `param` of `instruction`.
pub fn addressing_mode(instruction: i64, param: usize) -> i64 {
    let mut rest = instruction / 100;
    for _ in 1..param {
        rest /= 10;
    }
    rest % 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_low_two_digits() {
        assert_eq!(opcode(1002), 2);
        assert_eq!(opcode(99), 99);
        assert_eq!(opcode(21101), 1);
        assert_eq!(opcode(109), 9);
    }

    #[test]
    fn test_mode_sequence_of_1002() {
        let modes: Vec<_> = (1..=3)
            .map(|p| Mode::from_digit(addressing_mode(1002, p)))
            .collect();
        assert_eq!(
            modes,
            vec![Some(Mode::Position), Some(Mode::Immediate), Some(Mode::Position)]
        );
    }

    #[test]
    fn test_relative_mode_digit() {
        assert_eq!(addressing_mode(204, 1), 2);
        assert_eq!(addressing_mode(21201, 1), 2);
        assert_eq!(addressing_mode(21201, 2), 1);
        assert_eq!(addressing_mode(21201, 3), 2);
    }

    #[test]
    fn test_unknown_mode_digit() {
        assert_eq!(addressing_mode(301, 1), 3);
        assert_eq!(Mode::from_digit(3), None);
    }

    #[test]
    fn test_opcode_roundtrip_codes() {
        for code in [1, 2, 3, 4, 5, 6, 7, 8, 9, 99] {
            let op = Opcode::from_code(code).unwrap();
            assert_eq!(op.code(), code);
        }
        assert_eq!(Opcode::from_code(0), None);
        assert_eq!(Opcode::from_code(10), None);
        assert_eq!(Opcode::from_code(98), None);
    }

    #[test]
    fn test_arity_and_destination() {
        assert_eq!(Opcode::Add.arity(), 3);
        assert_eq!(Opcode::Add.destination(), Some(3));
        assert_eq!(Opcode::Input.destination(), Some(1));
        assert_eq!(Opcode::Output.destination(), None);
        assert_eq!(Opcode::JumpIfFalse.arity(), 2);
        assert_eq!(Opcode::Halt.arity(), 0);
        assert!(Opcode::AdjustRelativeBase.needs_relative_base());
        assert!(!Opcode::Equals.needs_relative_base());
    }
}

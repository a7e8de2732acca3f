use std::fmt::Write;

use crate::decode::{Mode, Opcode, addressing_mode, opcode};

/// Pretty-print a disassembly of `cells` for human inspection.
///
/// Walks the tape linearly from address 0. Anything that does not decode as
/// a complete instruction is listed as a single `data` cell, so code and data
/// interleave freely. Operands render as `[a]` (position), `#v` (immediate)
/// and `[rb+o]` (relative); a write target follows `->`.
pub fn disassemble(cells: &[i64]) -> String {
    let mut out = String::new();
    let mut pc = 0;
    while pc < cells.len() {
        match decode_at(cells, pc) {
            Some((op, text)) => {
                let width = 1 + op.arity();
                let raw = cells[pc..pc + width]
                    .iter()
                    .map(i64::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                let _ = writeln!(out, "{pc:04}: [{raw}]  {text}");
                pc += width;
            }
            None => {
                let _ = writeln!(out, "{pc:04}: [{}]  data", cells[pc]);
                pc += 1;
            }
        }
    }
    out
}

fn decode_at(cells: &[i64], pc: usize) -> Option<(Opcode, String)> {
    let instruction = cells[pc];
    let op = Opcode::from_code(opcode(instruction))?;
    let operands = cells.get(pc + 1..pc + 1 + op.arity())?;

    let mut sources = Vec::new();
    let mut dest = None;
    for (i, &raw) in operands.iter().enumerate() {
        let param = i + 1;
        let mode = Mode::from_digit(addressing_mode(instruction, param))?;
        let text = render(mode, raw);
        if op.destination() == Some(param) {
            if mode == Mode::Immediate {
                return None;
            }
            dest = Some(text);
        } else {
            sources.push(text);
        }
    }

    let mut text = op.mnemonic().to_string();
    if !sources.is_empty() {
        text.push(' ');
        text.push_str(&sources.join(", "));
    }
    if let Some(dest) = dest {
        text.push_str(" -> ");
        text.push_str(&dest);
    }
    Some((op, text))
}

fn render(mode: Mode, raw: i64) -> String {
    match mode {
        Mode::Position => format!("[{raw}]"),
        Mode::Immediate => format!("#{raw}"),
        Mode::Relative => format!("[rb{raw:+}]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(cells: &[i64]) -> Vec<String> {
        disassemble(cells).lines().map(str::to_string).collect()
    }

    #[test]
    fn test_multiply_then_data() {
        assert_eq!(
            lines(&[1002, 4, 3, 4, 33]),
            vec!["0000: [1002 4 3 4]  MUL [4], #3 -> [4]", "0004: [33]  data"]
        );
    }

    #[test]
    fn test_io_and_halt() {
        assert_eq!(
            lines(&[3, 9, 4, 9, 99]),
            vec!["0000: [3 9]  IN -> [9]", "0002: [4 9]  OUT [9]", "0004: [99]  HALT"]
        );
    }

    #[test]
    fn test_relative_operands() {
        let out = lines(&[109, 1, 204, -1, 21101, 2, 3, 4]);
        assert_eq!(out[0], "0000: [109 1]  ARB #1");
        assert_eq!(out[1], "0002: [204 -1]  OUT [rb-1]");
        assert_eq!(out[2], "0004: [21101 2 3 4]  ADD #2, #3 -> [rb+4]");
    }

    #[test]
    fn test_jumps() {
        assert_eq!(lines(&[1105, 1, 0]), vec!["0000: [1105 1 0]  JNZ #1, #0"]);
        assert_eq!(lines(&[6, 7, 8]), vec!["0000: [6 7 8]  JZ [7], [8]"]);
    }

    #[test]
    fn test_truncated_instruction_is_data() {
        assert_eq!(lines(&[1, 2]), vec!["0000: [1]  data", "0001: [2]  data"]);
    }

    #[test]
    fn test_undecodable_cells_are_data() {
        assert_eq!(lines(&[42, -1]), vec!["0000: [42]  data", "0001: [-1]  data"]);
        // Mode digit 3 does not exist.
        assert_eq!(lines(&[301, 0, 0, 0])[0], "0000: [301]  data");
        // Immediate write target.
        assert_eq!(lines(&[11101, 1, 1, 5])[0], "0000: [11101]  data");
    }

    #[test]
    fn test_empty_tape() {
        assert_eq!(disassemble(&[]), "");
    }
}

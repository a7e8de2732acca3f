use log::debug;

use crate::machine::{Fault, Machine, MachineConfig};
use crate::tape::{Tape, TapeError};

/// Largest noun or verb tried by [`find_noun_verb`].
pub const MAX_INPUT: i64 = 99;

/// Put a program into a restored state by writing its noun and verb into
/// cells 1 and 2.
pub fn restore(tape: &mut Tape, noun: i64, verb: i64) -> Result<(), TapeError> {
    tape.set(1, noun)?;
    tape.set(2, verb)
}

/// Run a fresh copy of `program` restored with `noun` and `verb`, and return
/// the value left in cell 0.
pub fn run_with(
    program: &Tape,
    noun: i64,
    verb: i64,
    config: MachineConfig,
) -> Result<i64, Fault> {
    let mut tape = program.clone();
    restore(&mut tape, noun, verb)?;
    let mut machine = Machine::new(tape, config);
    machine.run()?;
    Ok(machine.into_tape().get(0)?)
}

/// Find the first noun and verb, noun-major over 0..=99, for which the
/// program leaves `target` in cell 0. Trials that fault are skipped.
pub fn find_noun_verb(program: &Tape, target: i64, config: MachineConfig) -> Option<(i64, i64)> {
    for noun in 0..=MAX_INPUT {
        for verb in 0..=MAX_INPUT {
            match run_with(program, noun, verb, config) {
                Ok(value) if value == target => return Some((noun, verb)),
                Ok(_) => {}
                Err(fault) => debug!("noun {noun} verb {verb} faulted: {fault}"),
            }
        }
    }
    None
}

/// The combined answer for a noun and verb pair.
pub fn answer(noun: i64, verb: i64) -> i64 {
    100 * noun + verb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tape(source: &str) -> Tape {
        Tape::load(source).unwrap()
    }

    #[test]
    fn test_restore_writes_cells_one_and_two() {
        let mut t = tape("1,0,0,3,99");
        restore(&mut t, 12, 2).unwrap();
        assert_eq!(t.cells(), &[1, 12, 2, 3, 99]);
    }

    #[test]
    fn test_run_with_reads_cell_zero() {
        // Cell 0 becomes cell[noun] * cell[verb].
        let program = tape("2,0,0,0,99,7,6");
        assert_eq!(run_with(&program, 5, 6, MachineConfig::legacy()), Ok(42));
        // The source program is untouched.
        assert_eq!(program.cells()[1], 0);
    }

    #[test]
    fn test_run_with_program_without_restore_effect() {
        let program = tape("1,9,10,3,2,3,11,0,99,30,40,50");
        assert_eq!(run_with(&program, 9, 10, MachineConfig::default()), Ok(3500));
    }

    #[test]
    fn test_find_noun_verb() {
        // Cell 0 becomes cell[noun] + cell[verb]; only cell 4 holds 99.
        let program = tape("1,0,0,0,99");
        assert_eq!(
            find_noun_verb(&program, 100, MachineConfig::default()),
            Some((0, 4))
        );
        assert_eq!(answer(0, 4), 4);
    }

    #[test]
    fn test_find_noun_verb_none() {
        let program = tape("1,0,0,0,99");
        assert_eq!(find_noun_verb(&program, 1_000_000, MachineConfig::default()), None);
    }

    #[test]
    fn test_faulting_trials_are_skipped() {
        // Noun 1 jumps to the verb. Most targets fault or loop forever; only
        // verb 8 lands on a halt with cell 0 untouched.
        let program = tape("1105,1,0,0,0,0,0,0,99");
        let config = MachineConfig {
            step_limit: Some(100),
            ..MachineConfig::default()
        };
        assert_eq!(find_noun_verb(&program, 1105, config), Some((1, 8)));
    }

    #[test]
    fn test_answer() {
        assert_eq!(answer(12, 2), 1202);
    }
}

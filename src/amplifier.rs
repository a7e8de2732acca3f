use log::{debug, info, trace};
use thiserror::Error;

use crate::channel::{Input, Output, Queue};
use crate::machine::{Fault, Machine, MachineConfig, Status};
use crate::tape::Tape;

/// Number of amplifiers in a chain.
pub const AMPLIFIERS: usize = 5;

/// One phase setting per amplifier, in chain order.
pub type Phases = [i64; AMPLIFIERS];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmplifierError {
    #[error("amplifier {amplifier} faulted: {fault}")]
    Fault {
        amplifier: usize,
        #[source]
        fault: Fault,
    },
    #[error("amplifier {amplifier} halted without producing output")]
    NoOutput { amplifier: usize },
    #[error("phase settings {0:?} are not a permutation of 0 through 4")]
    InvalidPhases(Phases),
}

/// The strongest signal found by [`best_signal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Best {
    pub phases: Phases,
    pub signal: i64,
}

/// Tick `machine` until it writes exactly one value or leaves `Running`.
///
/// Returns the value written, or `None` if the machine halted first.
pub fn run_until_output<I: Input, O: Output>(
    machine: &mut Machine<I, O>,
) -> Result<Option<i64>, Fault> {
    let before = machine.emitted();
    while machine.is_running() && machine.emitted() == before {
        machine.tick();
    }
    match machine.status() {
        Status::Error(fault) => Err(fault.clone()),
        _ if machine.emitted() > before => Ok(machine.last_output()),
        _ => Ok(None),
    }
}

/// Whether `phases` uses each of 0 through 4 exactly once.
pub fn phases_are_valid(phases: &Phases) -> bool {
    let mut seen = [false; AMPLIFIERS];
    for &phase in phases {
        match usize::try_from(phase) {
            Ok(i) if i < AMPLIFIERS && !seen[i] => seen[i] = true,
            _ => return false,
        }
    }
    true
}

/// Every ordering of the phase settings, in lexicographic order.
pub fn permutations() -> Vec<Phases> {
    let mut phases: Phases = [0, 1, 2, 3, 4];
    let mut all = vec![phases];
    while next_permutation(&mut phases) {
        all.push(phases);
    }
    all
}

/// Rearrange `values` into the next lexicographic permutation. Returns false
/// once `values` is the last (descending) one.
fn next_permutation(values: &mut [i64]) -> bool {
    let Some(i) = values.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };
    let mut j = values.len() - 1;
    while values[j] <= values[i] {
        j -= 1;
    }
    values.swap(i, j);
    values[i + 1..].reverse();
    true
}

/// Run `program` through a single pass of the amplifier chain.
///
/// Each amplifier gets its own copy of the program. Amplifier `i` writes to
/// the queue amplifier `i + 1` reads from, which already holds that
/// amplifier's phase setting, so the signal lands right behind it. The first
/// amplifier is fed a signal of 0; the last one's output is the result.
pub fn thruster_signal(
    program: &Tape,
    phases: &Phases,
    config: MachineConfig,
) -> Result<i64, AmplifierError> {
    if !phases_are_valid(phases) {
        return Err(AmplifierError::InvalidPhases(*phases));
    }

    let queues: Vec<Queue> = (0..=AMPLIFIERS).map(|_| Queue::new()).collect();
    for (queue, &phase) in queues.iter().zip(phases) {
        queue.push(phase);
    }
    queues[0].push(0);

    let mut amplifiers: Vec<Machine> = (0..AMPLIFIERS)
        .map(|i| {
            Machine::with_channels(
                program.clone(),
                config,
                queues[i].clone(),
                queues[i + 1].clone(),
            )
        })
        .collect();

    for (amplifier, machine) in amplifiers.iter_mut().enumerate() {
        let signal = run_until_output(machine)
            .map_err(|fault| AmplifierError::Fault { amplifier, fault })?
            .ok_or(AmplifierError::NoOutput { amplifier })?;
        trace!(
            "amplifier {amplifier} (phase {}) produced {signal}",
            phases[amplifier]
        );
    }

    let signal = queues[AMPLIFIERS].pop().ok_or(AmplifierError::NoOutput {
        amplifier: AMPLIFIERS - 1,
    })?;
    debug!("phases {phases:?} -> thruster signal {signal}");
    Ok(signal)
}

/// Try every phase permutation and return the strongest thruster signal.
///
/// The first failing trial aborts the search.
pub fn best_signal(program: &Tape, config: MachineConfig) -> Result<Best, AmplifierError> {
    let candidates = permutations();
    let mut best = Best {
        phases: candidates[0],
        signal: i64::MIN,
    };
    for phases in &candidates {
        let signal = thruster_signal(program, phases, config)?;
        if signal > best.signal {
            best = Best {
                phases: *phases,
                signal,
            };
        }
    }
    info!(
        "searched {} phase settings, best {:?} -> {}",
        candidates.len(),
        best.phases,
        best.signal
    );
    Ok(best)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn validity_matches_sorted_check(phases in prop::array::uniform5(-2i64..7)) {
            let mut sorted = phases;
            sorted.sort();
            prop_assert_eq!(phases_are_valid(&phases), sorted == [0, 1, 2, 3, 4]);
        }

        #[test]
        fn valid_phases_are_enumerated(order in Just(vec![0i64, 1, 2, 3, 4]).prop_shuffle()) {
            let phases: Phases = order.try_into().unwrap();
            prop_assert!(permutations().contains(&phases));
        }
    }
}

//! Amplifier chains and feedback loops.
//!
//! Every amplifier runs the same program. It first reads its phase setting,
//! then an input signal, and emits an output signal. In a chain the signal
//! passes through each amplifier once; in a feedback loop the last amplifier
//! feeds the first until they all halt.

use crate::network::{Network, NetworkError, NodeId};
use crate::virtual_machine::Word;
use crate::virtual_machine::program::Program;
use crate::virtual_machine::vm::{Limits, Vm};

/// How amplifiers are connected.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AmplifierMode {
    /// Open chain, one pass.
    Chain,
    /// Closed ring, run until the last amplifier halts.
    Feedback,
}

/// Passes `signal` through one amplifier per phase, in order.
///
/// Each amplifier's first output becomes the next one's input signal.
pub fn amplify_chain(program: &Program, phases: &[Word], signal: Word) -> Result<Word, NetworkError> {
    if phases.is_empty() {
        return Err(NetworkError::EmptyNetwork);
    }

    let mut signal = signal;
    for (i, &phase) in phases.iter().enumerate() {
        let node = NodeId(i);
        let mut vm = Vm::from_program(program);
        vm.push_input(phase);
        vm.push_input(signal);
        vm.run()
            .map_err(|source| NetworkError::Machine { node, source })?;
        signal = vm.pop_output().map_err(|_| NetworkError::NoOutput { node })?;
    }
    Ok(signal)
}

/// Runs a feedback ring of amplifiers and returns the last signal emitted.
pub fn amplify_feedback(program: &Program, phases: &[Word], signal: Word) -> Result<Word, NetworkError> {
    let mut network = Network::ring(program, phases, Limits::default())?;
    network.node(NodeId(0))?.push_input(signal);
    network.run()?;

    let terminal = network.terminal().ok_or(NetworkError::EmptyNetwork)?;
    network
        .take_output(terminal)?
        .last()
        .copied()
        .ok_or(NetworkError::NoOutput { node: terminal })
}

/// Finds the phase order that produces the strongest signal.
///
/// Tries every permutation of `phases` and returns the best signal together
/// with the order that produced it. Ties keep the first order found.
pub fn max_signal(
    program: &Program,
    phases: &[Word],
    signal: Word,
    mode: AmplifierMode,
) -> Result<(Word, Vec<Word>), NetworkError> {
    if phases.is_empty() {
        return Err(NetworkError::EmptyNetwork);
    }

    let mut best: Option<(Word, Vec<Word>)> = None;
    for order in Permutations::new(phases.to_vec()) {
        let output = match mode {
            AmplifierMode::Chain => amplify_chain(program, &order, signal)?,
            AmplifierMode::Feedback => amplify_feedback(program, &order, signal)?,
        };
        if best.as_ref().is_none_or(|(top, _)| output > *top) {
            best = Some((output, order));
        }
    }
    best.ok_or(NetworkError::EmptyNetwork)
}

/// Iterator over all orderings of a list, using Heap's algorithm.
///
/// Yields the input order first; `n` items yield `n!` orderings, each
/// differing from the previous one by a single swap.
#[derive(Clone, Debug)]
pub struct Permutations<T> {
    items: Vec<T>,
    counters: Vec<usize>,
    index: usize,
    started: bool,
}

impl<T: Clone> Permutations<T> {
    pub fn new(items: Vec<T>) -> Self {
        let counters = vec![0; items.len()];
        Self {
            items,
            counters,
            index: 1,
            started: false,
        }
    }
}

impl<T: Clone> Iterator for Permutations<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            return Some(self.items.clone());
        }

        while self.index < self.items.len() {
            let i = self.index;
            if self.counters[i] < i {
                if i % 2 == 0 {
                    self.items.swap(0, i);
                } else {
                    self.items.swap(self.counters[i], i);
                }
                self.counters[i] += 1;
                self.index = 1;
                return Some(self.items.clone());
            }
            self.counters[i] = 0;
            self.index += 1;
        }
        None
    }
}

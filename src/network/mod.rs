//! Networks of Intcode machines.
//!
//! A [`Network`] owns a set of machines whose channels are wired together and
//! drives them cooperatively on the calling thread: each round runs every
//! machine until it blocks or halts, in insertion order, until the terminal
//! machine halts. Because every machine suspends exactly at an input it cannot
//! satisfy, values emitted in one round are consumed in the same or the next.
//!
//! - [`amplifier`]: Amplifier chains, feedback loops and the max-signal search
//! - [`threaded`]: Feedback loop with one blocking worker per machine

pub mod amplifier;
pub mod threaded;

use crate::virtual_machine::errors::{ChannelError, VMError};
use crate::virtual_machine::program::Program;
use crate::virtual_machine::vm::{Limits, MachineState, Vm};
use crate::virtual_machine::Word;
use crate::{debug, error, info};
use intcode_derive::Error;
use std::fmt;

/// Index of a machine within a [`Network`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors raised while building or driving a network.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum NetworkError {
    #[error("unknown node {node}")]
    UnknownNode { node: NodeId },
    #[error("network has no machines")]
    EmptyNetwork,
    /// A machine raised a fatal fault.
    #[error("machine {node} faulted: {source}")]
    Machine { node: NodeId, source: VMError },
    #[error("output unavailable: {0}")]
    Output(#[from] ChannelError),
    /// The machine halted without emitting a value.
    #[error("machine {node} produced no output")]
    NoOutput { node: NodeId },
    /// A full round passed without any machine executing an instruction.
    #[error("network deadlocked in round {round}")]
    Deadlock { round: u64 },
    /// A worker blocked on input after every producer had stopped.
    #[error("machine {node} starved: its input channel closed")]
    Starved { node: NodeId },
    /// A worker thread panicked or was cancelled.
    #[error("worker failed: {0}")]
    Worker(String),
}

/// Machines wired through shared channels and driven round-robin.
#[derive(Debug, Default)]
pub struct Network {
    nodes: Vec<Vm>,
    terminal: Option<NodeId>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a machine and returns its id.
    pub fn add(&mut self, vm: Vm) -> NodeId {
        self.nodes.push(vm);
        NodeId(self.nodes.len() - 1)
    }

    /// Adds a new machine with default limits running `program`.
    pub fn spawn(&mut self, program: &Program) -> NodeId {
        self.add(Vm::from_program(program))
    }

    /// Feeds `from`'s output into `to`'s input.
    ///
    /// Replaces whatever `to` was reading from before.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), NetworkError> {
        let upstream = self.node(from)?.output().clone();
        self.node_mut(to)?.set_input(upstream);
        Ok(())
    }

    /// Builds a cycle of one machine per phase, each seeded with its phase.
    ///
    /// Machine `i` reads what machine `i - 1` writes, and the first machine
    /// reads what the last one writes. The last machine is the terminal.
    pub fn ring(program: &Program, phases: &[Word], limits: Limits) -> Result<Self, NetworkError> {
        if phases.is_empty() {
            return Err(NetworkError::EmptyNetwork);
        }

        let mut network = Self::new();
        for _ in phases {
            let mut vm = Vm::with_limits(limits);
            vm.load(program);
            network.add(vm);
        }

        let n = network.len();
        for i in 0..n {
            network.connect(NodeId((i + n - 1) % n), NodeId(i))?;
        }
        for (i, &phase) in phases.iter().enumerate() {
            network.nodes[i].push_input(phase);
        }
        network.terminal = Some(NodeId(n - 1));
        Ok(network)
    }

    /// Selects the machine whose halt ends [`run`](Self::run).
    pub fn set_terminal(&mut self, id: NodeId) -> Result<(), NetworkError> {
        self.node(id)?;
        self.terminal = Some(id);
        Ok(())
    }

    /// Returns the terminal machine, defaulting to the last one added.
    pub fn terminal(&self) -> Option<NodeId> {
        self.terminal
            .or_else(|| self.nodes.len().checked_sub(1).map(NodeId))
    }

    pub fn node(&self, id: NodeId) -> Result<&Vm, NetworkError> {
        self.nodes
            .get(id.0)
            .ok_or(NetworkError::UnknownNode { node: id })
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Vm, NetworkError> {
        self.nodes
            .get_mut(id.0)
            .ok_or(NetworkError::UnknownNode { node: id })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drives every machine round-robin until the terminal halts.
    ///
    /// Returns the number of rounds driven. Fails with
    /// [`NetworkError::Deadlock`] when a whole round executes no instruction
    /// while the terminal is still running.
    pub fn run(&mut self) -> Result<u64, NetworkError> {
        let terminal = self.terminal().ok_or(NetworkError::EmptyNetwork)?;
        self.node(terminal)?;
        info!(
            "Driving network of {} machines, terminal {}",
            self.nodes.len(),
            terminal
        );

        let mut round = 0u64;
        if self.nodes[terminal.0].state() == MachineState::Halted {
            return Ok(round);
        }

        loop {
            round += 1;
            let mut progressed = false;
            for (i, vm) in self.nodes.iter_mut().enumerate() {
                let before = vm.steps();
                let state = vm.run().map_err(|source| NetworkError::Machine {
                    node: NodeId(i),
                    source,
                })?;
                let executed = vm.steps() - before;
                debug!("round {round}: machine #{i} ran {executed} instructions, now {state:?}");
                progressed |= executed > 0;

                // Later machines must not consume what the terminal left behind.
                if i == terminal.0 && state == MachineState::Halted {
                    info!("Network finished after {round} rounds");
                    return Ok(round);
                }
            }

            if !progressed {
                error!("Network deadlocked in round {round}: every machine is blocked or halted");
                return Err(NetworkError::Deadlock { round });
            }
        }
    }

    /// Removes and returns the oldest value `id` has written.
    pub fn pop_output(&self, id: NodeId) -> Result<Word, NetworkError> {
        Ok(self.node(id)?.pop_output()?)
    }

    /// Removes and returns every value queued on `id`'s output channel.
    pub fn take_output(&self, id: NodeId) -> Result<Vec<Word>, NetworkError> {
        Ok(self.node(id)?.drain_output())
    }
}

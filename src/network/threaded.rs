//! Feedback loop with one blocking worker per machine.
//!
//! Each machine runs on tokio's blocking pool and is linked to its neighbours
//! by unbounded mpsc channels. A worker runs its machine until it blocks,
//! forwards what it emitted downstream, then parks on `blocking_recv` for the
//! next input. A worker whose machine halts drops its sender, which is how
//! shutdown propagates around the ring.
//!
//! There is no deadlock detection here: a machine that loops forever without
//! reading input keeps its worker busy until the step limit, if any, trips.

use crate::network::{NetworkError, NodeId};
use crate::virtual_machine::Word;
use crate::virtual_machine::program::Program;
use crate::virtual_machine::vm::{Limits, MachineState, Vm};
use crate::{debug, error, info};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::spawn_blocking;

/// Runs a feedback ring of one machine per phase and returns every value the
/// last machine emitted that the first one did not consume.
///
/// Machine `i` reads what machine `i - 1` writes and the first machine reads
/// what the last one writes. Each machine is seeded with its phase, and the
/// first one then receives `signal`.
pub async fn run_feedback_loop(
    program: &Program,
    phases: &[Word],
    signal: Word,
    limits: Limits,
) -> Result<Vec<Word>, NetworkError> {
    if phases.is_empty() {
        return Err(NetworkError::EmptyNetwork);
    }
    let n = phases.len();
    info!("Starting threaded feedback loop with {n} workers");

    // Link i carries machine i's output to machine i + 1.
    let mut senders = Vec::with_capacity(n);
    let mut receivers = Vec::with_capacity(n);
    for _ in 0..n {
        let (tx, rx) = unbounded_channel::<Word>();
        senders.push(tx);
        receivers.push(Some(rx));
    }

    for (i, &phase) in phases.iter().enumerate() {
        seed(&senders[(i + n - 1) % n], phase)?;
    }
    seed(&senders[n - 1], signal)?;

    let mut handles = Vec::with_capacity(n);
    for i in 0..n {
        let node = NodeId(i);
        let rx = receivers[(i + n - 1) % n]
            .take()
            .ok_or_else(|| NetworkError::Worker(format!("link into {node} already taken")))?;
        let tx = senders[i].clone();
        let program = program.clone();
        handles.push(spawn_blocking(move || {
            drive_worker(node, program, limits, rx, tx)
        }));
    }
    drop(senders);

    let mut first_error: Option<NetworkError> = None;
    let mut feedback = None;
    for (i, handle) in handles.into_iter().enumerate() {
        let outcome = handle
            .await
            .map_err(|err| NetworkError::Worker(err.to_string()))
            .and_then(|result| result);
        match outcome {
            Ok(rx) if i == 0 => feedback = Some(rx),
            Ok(_) => {}
            Err(err) => {
                // Starvation is usually a consequence of another worker's failure.
                let replace = match &first_error {
                    None => true,
                    Some(NetworkError::Starved { .. }) => {
                        !matches!(err, NetworkError::Starved { .. })
                    }
                    Some(_) => false,
                };
                if replace {
                    first_error = Some(err);
                }
            }
        }
    }

    if let Some(err) = first_error {
        error!("Threaded feedback loop failed: {err}");
        return Err(err);
    }

    let mut outputs = Vec::new();
    if let Some(mut rx) = feedback {
        while let Ok(value) = rx.try_recv() {
            outputs.push(value);
        }
    }
    info!("Threaded feedback loop finished with {} pending outputs", outputs.len());
    Ok(outputs)
}

fn seed(link: &UnboundedSender<Word>, value: Word) -> Result<(), NetworkError> {
    link.send(value)
        .map_err(|err| NetworkError::Worker(err.to_string()))
}

/// Runs one machine to completion, returning its input link once it halts so
/// the caller can collect values nobody consumed.
fn drive_worker(
    node: NodeId,
    program: Program,
    limits: Limits,
    mut rx: UnboundedReceiver<Word>,
    tx: UnboundedSender<Word>,
) -> Result<UnboundedReceiver<Word>, NetworkError> {
    let mut vm = Vm::with_limits(limits);
    vm.load(&program);

    loop {
        let state = vm
            .run()
            .map_err(|source| NetworkError::Machine { node, source })?;
        for value in vm.drain_output() {
            // A halted downstream machine has dropped its receiver.
            let _ = tx.send(value);
        }

        match state {
            MachineState::Halted => {
                debug!("worker {node} halted after {} instructions", vm.steps());
                return Ok(rx);
            }
            _ => match rx.blocking_recv() {
                Some(value) => vm.push_input(value),
                None => {
                    error!("Worker {node} starved at pc {}", vm.pc());
                    return Err(NetworkError::Starved { node });
                }
            },
        }
    }
}

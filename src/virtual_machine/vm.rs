//! Intcode executor.
//!
//! A [`Vm`] owns its memory, program counter and relative base, reads input
//! from one [`Channel`] and appends output to another. Execution is a
//! resumable state machine: [`Vm::step`] runs one instruction, [`Vm::run`]
//! runs until the machine blocks on input or halts. A blocked machine retries
//! the same `input` instruction when resumed, so callers can push more input
//! and call `run` again.
//!
//! Arithmetic is checked: a result that does not fit in a [`Word`] is a
//! fault, as are negative addresses and unknown opcodes or modes. Faults are
//! latched until the next [`Vm::load`].

use crate::virtual_machine::Word;
use crate::virtual_machine::channel::Channel;
use crate::virtual_machine::decode::{Instruction, decode, describe_at};
use crate::virtual_machine::errors::{ChannelError, VMError};
use crate::virtual_machine::isa::Opcode;
use crate::virtual_machine::operand::to_address;
use crate::virtual_machine::program::Program;
use crate::warn;

mod limits;
mod memory;
mod profile;
#[cfg(test)]
mod tests;

pub use limits::{DEFAULT_MAX_MEMORY, EXTENDED_MEMORY_SIZE, Limits};
pub use memory::Memory;
pub use profile::ExecProfile;

/// Scheduling state reported after each step.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MachineState {
    /// The last instruction completed and the next one may run.
    Running,
    /// Waiting on an `input` instruction whose channel is empty.
    Blocked,
    /// Executed `halt`. Terminal until reloaded.
    Halted,
}

/// A single Intcode machine.
#[derive(Debug)]
pub struct Vm {
    memory: Memory,
    /// Address of the next instruction.
    pc: usize,
    relative_base: Word,
    input: Channel,
    output: Channel,
    state: MachineState,
    /// Latched fault, returned by every step until the next load.
    fault: Option<VMError>,
    limits: Limits,
    /// Instructions executed since load.
    steps: u64,
    profile: ExecProfile,
}

impl Default for Vm {
    fn default() -> Self {
        Self::with_limits(Limits::default())
    }
}

impl Vm {
    /// Creates an empty machine with default limits.
    ///
    /// An empty machine has no program; stepping it faults on opcode 0.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            memory: Memory::new(&[], limits.initial_capacity, limits.max_memory),
            pc: 0,
            relative_base: 0,
            input: Channel::new(),
            output: Channel::new(),
            state: MachineState::Running,
            fault: None,
            limits,
            steps: 0,
            profile: ExecProfile::new(),
        }
    }

    /// Creates a machine with default limits and `program` loaded.
    pub fn from_program(program: &Program) -> Self {
        let mut vm = Self::new();
        vm.load(program);
        vm
    }

    /// Loads a fresh copy of `program` and resets all execution state.
    ///
    /// Queued values on both channels are discarded. Channel wiring made with
    /// [`rebind_input`](Self::rebind_input) or [`set_input`](Self::set_input)
    /// is kept, so a reloaded network stays connected.
    pub fn load(&mut self, program: &Program) {
        self.memory = Memory::new(
            program.as_slice(),
            self.limits.initial_capacity,
            self.limits.max_memory,
        );
        self.pc = 0;
        self.relative_base = 0;
        self.input.clear();
        self.output.clear();
        self.state = MachineState::Running;
        self.fault = None;
        self.steps = 0;
        self.profile = ExecProfile::new();
    }

    /// Executes exactly one instruction.
    ///
    /// A halted machine stays halted without side effects. A machine that
    /// faulted keeps returning that fault.
    pub fn step(&mut self) -> Result<MachineState, VMError> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        if self.state == MachineState::Halted {
            return Ok(MachineState::Halted);
        }

        match self.execute_one() {
            Ok(state) => {
                self.state = state;
                Ok(state)
            }
            Err(err) => {
                warn!(
                    "machine fault at pc {}: {} ({})",
                    self.pc,
                    err,
                    describe_at(self.memory.as_slice(), self.pc)
                );
                self.fault = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Runs until the machine blocks on input or halts.
    pub fn run(&mut self) -> Result<MachineState, VMError> {
        loop {
            match self.step()? {
                MachineState::Running => continue,
                state => return Ok(state),
            }
        }
    }

    /// Runs to completion and returns every queued output value.
    ///
    /// Fails with [`VMError::InputExhausted`] if the machine blocks instead.
    /// The machine stays blocked and can be resumed after more input arrives.
    pub fn run_to_halt(&mut self) -> Result<Vec<Word>, VMError> {
        match self.run()? {
            MachineState::Halted => Ok(self.drain_output()),
            _ => Err(VMError::InputExhausted { pc: self.pc }),
        }
    }

    /// Appends a value to this machine's input channel.
    pub fn push_input(&self, value: Word) {
        self.input.push(value);
    }

    /// Removes and returns the oldest queued output value.
    pub fn pop_output(&self) -> Result<Word, ChannelError> {
        self.output.pop().ok_or(ChannelError::Empty)
    }

    /// Removes and returns every queued output value, oldest first.
    pub fn drain_output(&self) -> Vec<Word> {
        self.output.drain()
    }

    /// Returns a copy of the current memory.
    pub fn memory_snapshot(&self) -> Vec<Word> {
        self.memory.as_slice().to_vec()
    }

    /// Reads the cell at `address`. Cells past the allocated extent read as zero.
    pub fn read(&self, address: Word) -> Result<Word, VMError> {
        let cell = usize::try_from(address).map_err(|_| VMError::InvalidAddress { address })?;
        Ok(self.memory.read(cell))
    }

    /// Writes the cell at `address`, growing memory as an executed store would.
    pub fn write(&mut self, address: Word, value: Word) -> Result<(), VMError> {
        let cell = usize::try_from(address).map_err(|_| VMError::InvalidAddress { address })?;
        self.memory.write(cell, value)
    }

    /// Handle to the channel this machine reads from.
    pub fn input(&self) -> &Channel {
        &self.input
    }

    /// Handle to the channel this machine writes to.
    pub fn output(&self) -> &Channel {
        &self.output
    }

    /// Reads from `upstream`'s output channel from now on.
    pub fn rebind_input(&mut self, upstream: &Vm) {
        self.set_input(upstream.output.clone());
    }

    /// Replaces the input channel handle.
    pub fn set_input(&mut self, channel: Channel) {
        self.input = channel;
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn relative_base(&self) -> Word {
        self.relative_base
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    /// Returns the latched fault, if any.
    pub fn fault(&self) -> Option<&VMError> {
        self.fault.as_ref()
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn profile(&self) -> &ExecProfile {
        &self.profile
    }

    /// Decodes and executes the instruction at `pc`.
    ///
    /// Commits the pc advance only after the instruction took effect.
    fn execute_one(&mut self) -> Result<MachineState, VMError> {
        if let Some(limit) = self.limits.max_steps {
            if self.steps >= limit {
                return Err(VMError::StepLimitExceeded { limit });
            }
        }

        let instr = decode(self.memory.as_slice(), self.pc)?;
        let mut next = instr.next_pc();

        match instr.opcode {
            Opcode::Add => self.op_add(&instr)?,
            Opcode::Mul => self.op_mul(&instr)?,
            Opcode::Input => {
                if !self.op_input(&instr)? {
                    return Ok(MachineState::Blocked);
                }
            }
            Opcode::Output => self.op_output(&instr)?,
            Opcode::JumpIfTrue => {
                if let Some(target) = self.op_jump(&instr, true)? {
                    next = target;
                }
            }
            Opcode::JumpIfFalse => {
                if let Some(target) = self.op_jump(&instr, false)? {
                    next = target;
                }
            }
            Opcode::LessThan => self.op_compare(&instr, |a, b| a < b)?,
            Opcode::Equals => self.op_compare(&instr, |a, b| a == b)?,
            Opcode::AdjustRelativeBase => self.op_adjust_relative_base(&instr)?,
            Opcode::Halt => {
                self.retire(instr.opcode);
                return Ok(MachineState::Halted);
            }
        }

        self.pc = next;
        self.retire(instr.opcode);
        Ok(MachineState::Running)
    }

    fn retire(&mut self, opcode: Opcode) {
        self.steps += 1;
        self.profile.record(opcode);
    }

    #[inline(always)]
    fn value(&self, instr: &Instruction, index: usize) -> Result<Word, VMError> {
        instr.value(index, self.memory.as_slice(), self.relative_base)
    }

    #[inline(always)]
    fn store(&mut self, instr: &Instruction, index: usize, value: Word) -> Result<(), VMError> {
        let address = instr.location(index, self.relative_base)?;
        self.memory.write(address, value)
    }

    fn op_add(&mut self, instr: &Instruction) -> Result<(), VMError> {
        let a = self.value(instr, 0)?;
        let b = self.value(instr, 1)?;
        let sum = a.checked_add(b).ok_or(VMError::ArithmeticOverflow {
            instruction: instr.opcode.mnemonic(),
            pc: instr.pc,
        })?;
        self.store(instr, 2, sum)
    }

    fn op_mul(&mut self, instr: &Instruction) -> Result<(), VMError> {
        let a = self.value(instr, 0)?;
        let b = self.value(instr, 1)?;
        let product = a.checked_mul(b).ok_or(VMError::ArithmeticOverflow {
            instruction: instr.opcode.mnemonic(),
            pc: instr.pc,
        })?;
        self.store(instr, 2, product)
    }

    /// Returns `false` without side effects when no input is queued.
    fn op_input(&mut self, instr: &Instruction) -> Result<bool, VMError> {
        let address = instr.location(0, self.relative_base)?;
        let Some(value) = self.input.pop() else {
            return Ok(false);
        };
        self.memory.write(address, value)?;
        self.profile.record_input();
        Ok(true)
    }

    fn op_output(&mut self, instr: &Instruction) -> Result<(), VMError> {
        let value = self.value(instr, 0)?;
        self.output.push(value);
        self.profile.record_output();
        Ok(())
    }

    /// Returns the jump target when the branch is taken.
    ///
    /// Both parameters are resolved either way, so a bad target operand
    /// faults even when the branch falls through.
    fn op_jump(&self, instr: &Instruction, when_nonzero: bool) -> Result<Option<usize>, VMError> {
        let condition = self.value(instr, 0)?;
        let target = self.value(instr, 1)?;
        if (condition != 0) != when_nonzero {
            return Ok(None);
        }
        to_address(target, instr.pc).map(Some)
    }

    fn op_compare(
        &mut self,
        instr: &Instruction,
        cmp: impl Fn(Word, Word) -> bool,
    ) -> Result<(), VMError> {
        let a = self.value(instr, 0)?;
        let b = self.value(instr, 1)?;
        self.store(instr, 2, Word::from(cmp(a, b)))
    }

    fn op_adjust_relative_base(&mut self, instr: &Instruction) -> Result<(), VMError> {
        let delta = self.value(instr, 0)?;
        self.relative_base =
            self.relative_base
                .checked_add(delta)
                .ok_or(VMError::ArithmeticOverflow {
                    instruction: instr.opcode.mnemonic(),
                    pc: instr.pc,
                })?;
        Ok(())
    }
}

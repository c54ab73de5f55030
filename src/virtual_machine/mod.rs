//! Intcode virtual machine.
//!
//! Programs are flat sequences of signed words that live in the same memory
//! they operate on, so a program may rewrite its own instructions. Machines
//! exchange words through FIFO channels and suspend when they need input that
//! has not arrived yet, which lets several of them be wired into a network
//! and driven cooperatively (see [`crate::network`]).
//!
//! # Architecture
//!
//! - **Memory**: one growable array of [`Word`]s; unallocated cells read as zero
//! - **Instruction format**: `opcode + 100*mode0 + 1000*mode1 + 10000*mode2`,
//!   followed by one word per parameter
//! - **Addressing modes**: position, immediate and relative (to the relative base)
//! - **Execution model**: decode lazily at each pc visit, then run until the
//!   machine halts or blocks on input
//! - **Limits**: optional instruction budget and a ceiling on memory growth
//!
//! # Modules
//!
//! - [`channel`]: Shared FIFO queues used as machine input and output
//! - [`decode`]: Instruction decoding and disassembly
//! - [`errors`]: Execution and channel error types
//! - [`isa`]: Instruction set definition and opcode mappings
//! - [`operand`]: Addressing modes and parameter resolution
//! - [`program`]: Program images and text parsing
//! - [`vm`]: Executor, memory, limits and execution profile

pub mod channel;
pub mod decode;
pub mod errors;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod operand;
pub mod program;
pub mod vm;

/// Machine word. Products of two full 64-bit values still fit.
pub type Word = i128;

pub use channel::Channel;
pub use errors::{ChannelError, VMError};
pub use program::Program;
pub use vm::{Limits, MachineState, Vm};

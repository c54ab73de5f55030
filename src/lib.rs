//! Intcode library.
//!
//! Provides an Intcode virtual machine and the plumbing to wire several
//! machines into networks, driven either cooperatively on one thread or with
//! one blocking worker per machine.

pub mod network;
pub mod utils;
pub mod virtual_machine;

//! Instruction decoding and disassembly.
//!
//! Decoding is purely syntactic: it splits the instruction word at `pc` into an
//! opcode and per-parameter modes and collects the raw operands. Parameters are
//! resolved against memory and the relative base only when the executor asks
//! for them, so a program may rewrite any word before it is reached.

use crate::virtual_machine::Word;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::isa::Opcode;
use crate::virtual_machine::operand::{Mode, Param, word_at};
use std::fmt;

/// Largest parameter count of any opcode.
pub const MAX_PARAMS: usize = 3;

/// A single decoded instruction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Instruction {
    /// Address of the instruction word.
    pub pc: usize,
    pub opcode: Opcode,
    params: [Param; MAX_PARAMS],
}

impl Instruction {
    /// Returns the parameters the opcode declares, in encoding order.
    pub fn params(&self) -> &[Param] {
        &self.params[..self.opcode.arity()]
    }

    /// Address of the instruction that follows when no jump is taken.
    pub fn next_pc(&self) -> usize {
        self.pc + self.opcode.encoded_len()
    }

    /// Resolves parameter `index` to a value.
    pub fn value(&self, index: usize, memory: &[Word], relative_base: Word) -> Result<Word, VMError> {
        self.params[index].value(
            memory,
            relative_base,
            index,
            self.pc,
            self.opcode.mnemonic(),
        )
    }

    /// Resolves parameter `index` to a writable location.
    pub fn location(&self, index: usize, relative_base: Word) -> Result<usize, VMError> {
        self.params[index].location(relative_base, index, self.pc, self.opcode.mnemonic())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode.mnemonic())?;
        for (i, param) in self.params().iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{param}")?;
        }
        Ok(())
    }
}

/// Decodes the instruction at `pc`.
///
/// Unknown opcodes and mode digits are reported with the faulting `pc`.
/// Mode digits above the opcode's declared parameters are ignored.
pub fn decode(memory: &[Word], pc: usize) -> Result<Instruction, VMError> {
    let word = word_at(memory, pc);
    let opcode = Opcode::try_from(word % 100).map_err(|_| VMError::InvalidOpcode {
        opcode: word % 100,
        pc,
    })?;

    let mut params = [Param::UNUSED; MAX_PARAMS];
    let mut divisor: Word = 100;
    for (i, slot) in params.iter_mut().take(opcode.arity()).enumerate() {
        let digit = (word / divisor) % 10;
        let mode = Mode::try_from(digit).map_err(|_| VMError::InvalidMode {
            mode: digit,
            param: i,
            pc,
        })?;
        *slot = Param {
            mode,
            raw: word_at(memory, pc + 1 + i),
        };
        divisor *= 10;
    }

    Ok(Instruction { pc, opcode, params })
}

/// Disassembles a memory image linearly from address 0.
///
/// Words that do not decode are rendered as `DATA n` and skipped one at a
/// time, so trailing data after the last instruction stays readable.
pub fn disassemble(memory: &[Word]) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pc = 0;
    while pc < memory.len() {
        match decode(memory, pc) {
            Ok(instr) => {
                lines.push((pc, instr.to_string()));
                pc = instr.next_pc();
            }
            Err(_) => {
                lines.push((pc, format!("DATA {}", memory[pc])));
                pc += 1;
            }
        }
    }
    lines
}

/// Renders the instruction at `pc` for diagnostics, falling back to the raw word.
pub fn describe_at(memory: &[Word], pc: usize) -> String {
    match decode(memory, pc) {
        Ok(instr) => instr.to_string(),
        Err(_) => format!("DATA {}", word_at(memory, pc)),
    }
}

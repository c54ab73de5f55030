//! Parameter addressing modes and their resolution.

use crate::virtual_machine::Word;
use crate::virtual_machine::errors::VMError;
use std::fmt;

/// How a parameter's operand word is interpreted.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Operand is an absolute address.
    Position = 0,
    /// Operand is the value itself. Never writable.
    Immediate = 1,
    /// Operand is an address offset by the relative base.
    Relative = 2,
}

impl TryFrom<Word> for Mode {
    type Error = VMError;

    fn try_from(value: Word) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Position),
            1 => Ok(Self::Immediate),
            2 => Ok(Self::Relative),
            _ => Err(VMError::InvalidMode {
                mode: value,
                param: 0,
                pc: 0,
            }),
        }
    }
}

/// One decoded parameter: its addressing mode and raw operand word.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Param {
    pub mode: Mode,
    pub raw: Word,
}

impl Param {
    /// Placeholder for unused parameter slots.
    pub(crate) const UNUSED: Param = Param {
        mode: Mode::Immediate,
        raw: 0,
    };

    /// Returns the memory location this parameter designates.
    ///
    /// Fails with [`VMError::ImmediateWrite`] for immediate parameters and
    /// [`VMError::NegativeAddress`] when the address falls below zero.
    pub fn location(
        &self,
        relative_base: Word,
        index: usize,
        pc: usize,
        instruction: &'static str,
    ) -> Result<usize, VMError> {
        let address = match self.mode {
            Mode::Position => self.raw,
            Mode::Immediate => return Err(VMError::ImmediateWrite { param: index, pc }),
            Mode::Relative => relative_base
                .checked_add(self.raw)
                .ok_or(VMError::ArithmeticOverflow { instruction, pc })?,
        };
        to_address(address, pc)
    }

    /// Returns the value this parameter resolves to against `memory`.
    ///
    /// Cells past the end of `memory` read as zero.
    pub fn value(
        &self,
        memory: &[Word],
        relative_base: Word,
        index: usize,
        pc: usize,
        instruction: &'static str,
    ) -> Result<Word, VMError> {
        if self.mode == Mode::Immediate {
            return Ok(self.raw);
        }
        let address = self.location(relative_base, index, pc, instruction)?;
        Ok(word_at(memory, address))
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            Mode::Position => write!(f, "[{}]", self.raw),
            Mode::Immediate => write!(f, "{}", self.raw),
            Mode::Relative if self.raw < 0 => write!(f, "[rb-{}]", self.raw.unsigned_abs()),
            Mode::Relative => write!(f, "[rb+{}]", self.raw),
        }
    }
}

/// Converts a computed address to an index, rejecting negative values.
pub fn to_address(address: Word, pc: usize) -> Result<usize, VMError> {
    usize::try_from(address).map_err(|_| VMError::NegativeAddress { address, pc })
}

/// Reads `memory[address]`, treating unallocated cells as zero.
#[inline(always)]
pub fn word_at(memory: &[Word], address: usize) -> Word {
    memory.get(address).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(mode: Mode, raw: Word) -> Param {
        Param { mode, raw }
    }

    #[test]
    fn mode_try_from_valid() {
        assert_eq!(Mode::try_from(0).unwrap(), Mode::Position);
        assert_eq!(Mode::try_from(1).unwrap(), Mode::Immediate);
        assert_eq!(Mode::try_from(2).unwrap(), Mode::Relative);
    }

    #[test]
    fn mode_try_from_invalid() {
        for digit in 3..=9 {
            assert!(matches!(
                Mode::try_from(digit),
                Err(VMError::InvalidMode { mode, .. }) if mode == digit
            ));
        }
    }

    #[test]
    fn position_resolves_through_memory() {
        let memory = [10, 20, 30];
        let p = param(Mode::Position, 2);
        assert_eq!(p.value(&memory, 0, 0, 0, "ADD").unwrap(), 30);
        assert_eq!(p.location(0, 0, 0, "ADD").unwrap(), 2);
    }

    #[test]
    fn immediate_is_literal_and_unwritable() {
        let p = param(Mode::Immediate, -7);
        assert_eq!(p.value(&[], 0, 0, 0, "ADD").unwrap(), -7);
        assert_eq!(
            p.location(0, 2, 5, "ADD"),
            Err(VMError::ImmediateWrite { param: 2, pc: 5 })
        );
    }

    #[test]
    fn relative_offsets_by_base() {
        let memory = [1, 2, 3, 4];
        let p = param(Mode::Relative, -1);
        assert_eq!(p.value(&memory, 3, 0, 0, "OUT").unwrap(), 3);
        assert_eq!(p.location(3, 0, 0, "OUT").unwrap(), 2);
    }

    #[test]
    fn reads_past_end_are_zero() {
        let p = param(Mode::Position, 1_000);
        assert_eq!(p.value(&[1, 2], 0, 0, 0, "OUT").unwrap(), 0);
    }

    #[test]
    fn negative_addresses_fault() {
        assert_eq!(
            param(Mode::Position, -3).value(&[], 0, 0, 4, "OUT"),
            Err(VMError::NegativeAddress { address: -3, pc: 4 })
        );
        assert_eq!(
            param(Mode::Relative, -5).location(2, 0, 9, "IN"),
            Err(VMError::NegativeAddress { address: -3, pc: 9 })
        );
    }

    #[test]
    fn relative_overflow_faults() {
        assert_eq!(
            param(Mode::Relative, 1).location(Word::MAX, 0, 0, "IN"),
            Err(VMError::ArithmeticOverflow {
                instruction: "IN",
                pc: 0
            })
        );
    }

    #[test]
    fn display_forms() {
        assert_eq!(param(Mode::Position, 4).to_string(), "[4]");
        assert_eq!(param(Mode::Immediate, -4).to_string(), "-4");
        assert_eq!(param(Mode::Relative, 4).to_string(), "[rb+4]");
        assert_eq!(param(Mode::Relative, -4).to_string(), "[rb-4]");
    }
}

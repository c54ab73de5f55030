use crate::virtual_machine::Word;
use intcode_derive::Error;

/// Fatal faults raised while loading or executing a program.
///
/// A machine that returns one of these stops executing and keeps reporting
/// the same fault until it is reloaded.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum VMError {
    /// Instruction word whose low two digits name no opcode.
    #[error("invalid opcode {opcode} at pc {pc}")]
    InvalidOpcode { opcode: Word, pc: usize },
    /// Addressing-mode digit other than 0, 1 or 2.
    #[error("invalid addressing mode {mode} for parameter {param} at pc {pc}")]
    InvalidMode { mode: Word, param: usize, pc: usize },
    /// Computed memory address below zero.
    #[error("negative address {address} at pc {pc}")]
    NegativeAddress { address: Word, pc: usize },
    /// Negative address passed to [`Vm::read`](super::vm::Vm::read) or
    /// [`Vm::write`](super::vm::Vm::write) from outside the program.
    #[error("invalid address {address}")]
    InvalidAddress { address: Word },
    /// Write-target parameter encoded in immediate mode.
    #[error("parameter {param} at pc {pc} is immediate and cannot be written")]
    ImmediateWrite { param: usize, pc: usize },
    /// Result does not fit in a machine word.
    #[error("{instruction} overflowed at pc {pc}")]
    ArithmeticOverflow {
        instruction: &'static str,
        pc: usize,
    },
    /// Write past the configured memory ceiling.
    #[error("address {address} exceeds the memory limit of {limit} cells")]
    MemoryLimitExceeded { address: usize, limit: usize },
    /// Instruction budget used up.
    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: u64 },
    /// Machine blocked on input while it was required to halt.
    #[error("input exhausted at pc {pc}")]
    InputExhausted { pc: usize },
    /// Malformed comma-separated program text.
    #[error("invalid program token {token:?} at position {position}")]
    ProgramParse { position: usize, token: String },
}

/// Errors raised by channel reads.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ChannelError {
    /// No value is queued.
    #[error("channel is empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_interpolates_fields() {
        let err = VMError::InvalidMode {
            mode: 7,
            param: 1,
            pc: 12,
        };
        assert_eq!(
            err.to_string(),
            "invalid addressing mode 7 for parameter 1 at pc 12"
        );
        assert_eq!(
            VMError::ProgramParse {
                position: 3,
                token: "x".into()
            }
            .to_string(),
            "invalid program token \"x\" at position 3"
        );
        assert_eq!(ChannelError::Empty.to_string(), "channel is empty");
    }
}

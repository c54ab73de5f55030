//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_instruction!`](crate::for_each_instruction) macro holds the
//! canonical opcode table and invokes a callback macro for code generation, so
//! the opcode enum, its decoding, mnemonics and parameter shapes all come from
//! one list.
//!
//! # Instruction Format
//!
//! An instruction is one word followed by one word per parameter:
//! - `word % 100`: opcode
//! - `word / 100 % 10`: addressing mode of parameter 0
//! - `word / 1000 % 10`: addressing mode of parameter 1
//! - `word / 10000 % 10`: addressing mode of parameter 2

use crate::virtual_machine::Word;
use crate::virtual_machine::errors::VMError;

/// Invokes a callback macro with the complete opcode table.
///
/// Each entry is `Name = code, "MNEMONIC" => [param: Kind, ...]` where `Kind`
/// is `Read` for parameters used as values and `Write` for store targets.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            /// ADD a, b, dst ; dst = a + b
            Add = 1, "ADD" => [a: Read, b: Read, dst: Write],
            /// MUL a, b, dst ; dst = a * b
            Mul = 2, "MUL" => [a: Read, b: Read, dst: Write],
            /// IN dst ; dst = next input value, blocking while none is queued
            Input = 3, "IN" => [dst: Write],
            /// OUT src ; append src to the output channel
            Output = 4, "OUT" => [src: Read],
            /// JNZ cond, target ; if cond != 0 then pc = target
            JumpIfTrue = 5, "JNZ" => [cond: Read, target: Read],
            /// JZ cond, target ; if cond == 0 then pc = target
            JumpIfFalse = 6, "JZ" => [cond: Read, target: Read],
            /// LT a, b, dst ; dst = (a < b) as 0|1
            LessThan = 7, "LT" => [a: Read, b: Read, dst: Write],
            /// EQ a, b, dst ; dst = (a == b) as 0|1
            Equals = 8, "EQ" => [a: Read, b: Read, dst: Write],
            /// ARB offset ; rb += offset
            AdjustRelativeBase = 9, "ARB" => [offset: Read],
            /// HALT ; stop forever
            Halt = 99, "HALT" => [],
        }
    };
}

/// How an instruction uses one of its parameters.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ParamKind {
    /// Parameter resolves to a value.
    Read,
    /// Parameter resolves to a writable memory location.
    Write,
}

#[macro_export]
macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $code:literal, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $code,
            )*
        }

        impl Opcode {
            /// Every opcode in table order.
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];

            /// Returns the assembly mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Returns how each parameter is used, in encoding order.
            pub const fn params(&self) -> &'static [ParamKind] {
                match self {
                    $( Opcode::$name => &[ $( ParamKind::$kind, )* ], )*
                }
            }

            /// Returns the numeric opcode as it appears in the low two digits.
            pub const fn code(&self) -> Word {
                *self as u8 as Word
            }
        }

        impl TryFrom<Word> for Opcode {
            type Error = VMError;

            fn try_from(value: Word) -> Result<Self, Self::Error> {
                match value {
                    $( $code => Ok(Opcode::$name), )*
                    _ => Err(VMError::InvalidOpcode {
                        opcode: value,
                        pc: 0,
                    }),
                }
            }
        }
    };
}

for_each_instruction!(define_opcodes);

impl Opcode {
    /// Number of parameter words following the instruction word.
    pub const fn arity(&self) -> usize {
        self.params().len()
    }

    /// Encoded length in words, including the instruction word itself.
    pub const fn encoded_len(&self) -> usize {
        1 + self.arity()
    }
}

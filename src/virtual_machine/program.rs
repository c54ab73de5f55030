//! Program images.
//!
//! A [`Program`] is the initial memory image of a machine. Machines copy it on
//! [`load`](crate::virtual_machine::vm::Vm::load), so one program can seed any
//! number of independent machines.

use crate::virtual_machine::Word;
use crate::virtual_machine::errors::VMError;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

/// Immutable sequence of words loaded at address 0.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Program(Vec<Word>);

impl Program {
    /// Wraps an owned word vector.
    pub fn new(words: Vec<Word>) -> Self {
        Self(words)
    }

    /// Returns the words of the image.
    pub fn as_slice(&self) -> &[Word] {
        &self.0
    }

    /// Consumes the program and returns its words.
    pub fn into_inner(self) -> Vec<Word> {
        self.0
    }
}

impl Deref for Program {
    type Target = [Word];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[Word]> for Program {
    fn as_ref(&self) -> &[Word] {
        &self.0
    }
}

impl From<Vec<Word>> for Program {
    fn from(words: Vec<Word>) -> Self {
        Self(words)
    }
}

impl From<&[Word]> for Program {
    fn from(words: &[Word]) -> Self {
        Self(words.to_vec())
    }
}

impl FromIterator<Word> for Program {
    fn from_iter<I: IntoIterator<Item = Word>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parses comma-separated decimal words, e.g. `"1,0,0,3,99\n"`.
///
/// Whitespace around the whole text and around each token is ignored. Blank
/// text is the empty program; a blank or non-numeric token is an error.
impl FromStr for Program {
    type Err = VMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Ok(Self::default());
        }

        text.split(',')
            .enumerate()
            .map(|(position, token)| {
                let token = token.trim();
                token.parse::<Word>().map_err(|_| VMError::ProgramParse {
                    position,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{word}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_puzzle_text() {
        let program: Program = "1,9,10,3,\n2,3,11,0,99,30,40,50\n".parse().unwrap();
        assert_eq!(
            program.as_slice(),
            &[1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50]
        );
    }

    #[test]
    fn parses_negative_and_large_words() {
        let program: Program = "104, 1125899906842624, -99".parse().unwrap();
        assert_eq!(program.as_slice(), &[104, 1125899906842624, -99]);
    }

    #[test]
    fn blank_text_is_empty_program() {
        assert!("".parse::<Program>().unwrap().is_empty());
        assert!(" \n".parse::<Program>().unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_tokens() {
        assert_eq!(
            "1,two,3".parse::<Program>(),
            Err(VMError::ProgramParse {
                position: 1,
                token: "two".into()
            })
        );
        assert_eq!(
            "1,,3".parse::<Program>(),
            Err(VMError::ProgramParse {
                position: 1,
                token: String::new()
            })
        );
    }

    #[test]
    fn display_is_comma_separated() {
        let program = Program::new(vec![3, 0, 4, 0, 99]);
        assert_eq!(program.to_string(), "3,0,4,0,99");
        assert_eq!(program.to_string().parse::<Program>().unwrap(), program);
    }
}

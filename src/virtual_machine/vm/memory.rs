use crate::virtual_machine::Word;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::operand::word_at;

/// Flat, growable machine memory.
///
/// Holds the program text and all data. Reads past the allocated extent
/// return zero without allocating; writes past it grow the buffer
/// (zero-filled) up to `limit` cells.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    cells: Vec<Word>,
    limit: usize,
}

impl Memory {
    /// Creates memory holding `image`, pre-sized to at least `capacity` cells.
    pub fn new(image: &[Word], capacity: usize, limit: usize) -> Self {
        let mut cells = Vec::with_capacity(image.len().max(capacity));
        cells.extend_from_slice(image);
        if cells.len() < capacity {
            cells.resize(capacity, 0);
        }
        Self { cells, limit }
    }

    /// Returns the word at `address`, or zero past the allocated extent.
    #[inline(always)]
    pub fn read(&self, address: usize) -> Word {
        word_at(&self.cells, address)
    }

    /// Stores `value` at `address`, growing memory if needed.
    ///
    /// Returns [`VMError::MemoryLimitExceeded`] if growth would pass the limit.
    pub fn write(&mut self, address: usize, value: Word) -> Result<(), VMError> {
        if address >= self.cells.len() {
            if address >= self.limit {
                return Err(VMError::MemoryLimitExceeded {
                    address,
                    limit: self.limit,
                });
            }
            self.cells.resize(address + 1, 0);
        }
        self.cells[address] = value;
        Ok(())
    }

    /// Number of allocated cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn as_slice(&self) -> &[Word] {
        &self.cells
    }
}

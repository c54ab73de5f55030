/// Default growth ceiling for machine memory, in cells.
pub const DEFAULT_MAX_MEMORY: usize = 1 << 24;

/// Fixed memory size of the extended configuration.
pub const EXTENDED_MEMORY_SIZE: usize = 10_000;

/// Per-machine execution limits.
///
/// The defaults impose no instruction budget and size memory to the loaded
/// program, matching plain Intcode semantics.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Limits {
    /// Minimum number of cells allocated at load.
    pub initial_capacity: usize,
    /// Memory may not grow past this many cells.
    pub max_memory: usize,
    /// Maximum instructions executed between loads, if any.
    pub max_steps: Option<u64>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            max_memory: DEFAULT_MAX_MEMORY,
            max_steps: None,
        }
    }
}

impl Limits {
    /// Preallocates [`EXTENDED_MEMORY_SIZE`] zeroed cells at load.
    pub fn extended() -> Self {
        Self {
            initial_capacity: EXTENDED_MEMORY_SIZE,
            ..Self::default()
        }
    }

    pub fn with_initial_capacity(mut self, cells: usize) -> Self {
        self.initial_capacity = cells;
        self
    }

    pub fn with_max_memory(mut self, cells: usize) -> Self {
        self.max_memory = cells;
        self
    }

    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }
}

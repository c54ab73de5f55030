use crate::virtual_machine::isa::Opcode;

/// One slot per two-digit opcode value.
const OPCODE_SLOTS: usize = 100;

/// Execution profile for a machine since its last load.
///
/// Counts executed instructions per opcode, plus the values consumed from
/// the input channel and produced on the output channel. Backed by a flat
/// array indexed by opcode number.
#[derive(Clone, Debug)]
pub struct ExecProfile {
    counts: [u64; OPCODE_SLOTS],
    inputs: u64,
    outputs: u64,
}

impl Default for ExecProfile {
    fn default() -> Self {
        Self {
            counts: [0; OPCODE_SLOTS],
            inputs: 0,
            outputs: 0,
        }
    }
}

impl ExecProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one executed instruction.
    #[inline(always)]
    pub(super) fn record(&mut self, opcode: Opcode) {
        let slot = &mut self.counts[opcode as usize];
        *slot = slot.saturating_add(1);
    }

    pub(super) fn record_input(&mut self) {
        self.inputs = self.inputs.saturating_add(1);
    }

    pub(super) fn record_output(&mut self) {
        self.outputs = self.outputs.saturating_add(1);
    }

    /// Number of times `opcode` executed.
    pub fn count(&self, opcode: Opcode) -> u64 {
        self.counts[opcode as usize]
    }

    /// Total instructions executed.
    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .fold(0u64, |acc, &v| acc.saturating_add(v))
    }

    pub fn inputs(&self) -> u64 {
        self.inputs
    }

    pub fn outputs(&self) -> u64 {
        self.outputs
    }

    /// Returns every opcode with its count, in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Opcode, u64)> + '_ {
        Opcode::ALL.iter().map(|op| (*op, self.counts[*op as usize]))
    }
}

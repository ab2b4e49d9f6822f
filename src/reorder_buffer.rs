use std::collections::BTreeMap;

use crate::instruction::Instruction;

/// Completed instructions waiting for in-order retirement reporting, keyed by
/// tag. Completion is out of order; reporting is strictly sequential and
/// gap-free. Entries are dropped once reported, nothing reads a tag twice.
#[derive(Debug, Default)]
pub struct ReorderLedger {
    entries: BTreeMap<u64, Instruction>,
    next_report: u64,
}
impl ReorderLedger {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_report: 1,
        }
    }

    /// The next tag the reporter is waiting on.
    pub fn next_report(&self) -> u64 {
        self.next_report
    }

    pub fn push(&mut self, inst: Instruction) {
        let _ = self.entries.insert(inst.tag, inst);
    }

    /// Report every instruction from the expected tag upward, stopping at the
    /// first tag still in flight.
    pub fn drain_in_order(&mut self) -> Vec<Instruction> {
        let mut reported = Vec::new();
        while let Some(inst) = self.entries.remove(&self.next_report) {
            reported.push(inst);
            self.next_report += 1;
        }
        reported
    }
}

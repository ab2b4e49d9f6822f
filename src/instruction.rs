use num_derive::FromPrimitive;

use crate::trace::TraceInst;

/// Which class of functional unit executes an instruction. The trace encodes
/// this as an integer in {-1, 0, 1, 2}; -1 means "unspecified" and is
/// normalised to class 0 by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum UnitClass {
    K0 = 0,
    K1 = 1,
    K2 = 2,
}
impl UnitClass {
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// One in-flight instruction: identity, register operands and everything the
/// pipeline learns about it on the way through. Moves between structures by
/// copy, never by shared reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction {
    /// Assigned at fetch, strictly increasing: the program-order key.
    pub tag: u64,
    pub address: u64,
    pub class: Option<UnitClass>,
    pub src: [Option<u32>; 2],
    pub dest: Option<u32>,
    /// Selected by wake-up, waiting for (or past) issue into its unit.
    pub fired: bool,
    /// Result broadcast; the station slot is reclaimed next cycle.
    pub retiring: bool,
    /// Station slot index of the outstanding producer each operand waits on.
    pub dep: [Option<usize>; 2],
    /// Functional-unit slot this instruction was bound to by wake-up.
    pub unit: Option<usize>,
    pub fetched: Option<u64>,
    pub dispatched: Option<u64>,
    pub scheduled: Option<u64>,
    pub executed: Option<u64>,
    pub completed: Option<u64>,
}
impl Instruction {
    /// A freshly fetched instruction: identity from the trace record, every
    /// pipeline flag and timestamp still unset.
    pub fn from_trace(tag: u64, raw: &TraceInst) -> Self {
        Self {
            tag,
            address: raw.address,
            class: raw.class,
            src: raw.src,
            dest: raw.dest,
            fired: false,
            retiring: false,
            dep: [None, None],
            unit: None,
            fetched: None,
            dispatched: None,
            scheduled: None,
            executed: None,
            completed: None,
        }
    }

    /// Both operands available, so the instruction may be selected.
    pub fn operands_ready(&self) -> bool {
        self.dep[0].is_none() && self.dep[1].is_none()
    }
}

use std::collections::VecDeque;

use log::trace;

use crate::error::SimError;
use crate::event_log::{self, EventLog, Stage};
use crate::instruction::Instruction;
use crate::trace::TraceSource;

/// Pulls raw records from the trace every cycle and buffers them, modelling
/// the instruction-cache window. Tags are assigned here and nowhere else.
pub struct Fetcher {
    fetch_width: usize,
    pub queue: VecDeque<Instruction>,
    exhausted: bool,
}
impl Fetcher {
    pub fn new(fetch_width: usize) -> Self {
        Self {
            fetch_width,
            queue: VecDeque::new(),
            exhausted: false,
        }
    }

    /// The trace has reported end-of-stream; fetch produces nothing further.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Phase 0: read up to `fetch_width` records, tagging and stamping each.
    /// Returns how many were fetched so the driver can enable dispatch after
    /// the first success. Exhaustion is not an error, the run just drains.
    pub fn fetch<S: TraceSource>(
        &mut self,
        source: &mut S,
        clk: u64,
        next_tag: &mut u64,
        log: &mut Option<EventLog>,
    ) -> Result<usize, SimError> {
        if self.exhausted {
            return Ok(0);
        }

        let mut fetched = 0;
        for _ in 0..self.fetch_width {
            match source.next_inst()? {
                Some(raw) => {
                    let mut inst = Instruction::from_trace(*next_tag, &raw);
                    inst.fetched = Some(clk);
                    trace!(
                        "cycle {clk}: fetched tag {} addr {:#x}",
                        inst.tag,
                        inst.address
                    );
                    event_log::record(log, clk, Stage::Fetched, inst.tag)?;
                    self.queue.push_back(inst);
                    *next_tag += 1;
                    fetched += 1;
                }
                None => {
                    self.exhausted = true;
                    break;
                }
            }
        }
        Ok(fetched)
    }
}

use std::collections::VecDeque;

use crate::error::SimError;
use crate::event_log::{self, EventLog, Stage};
use crate::fetcher::Fetcher;
use crate::instruction::Instruction;
use crate::reservation_station::ReservationStation;

/// FIFO between fetch and reservation-station allocation. Becomes eligible
/// on the first successful fetch and stays eligible for the rest of the run.
pub struct Dispatcher {
    fetch_width: usize,
    pub queue: VecDeque<Instruction>,
    enabled: bool,
}
impl Dispatcher {
    pub fn new(fetch_width: usize) -> Self {
        Self {
            fetch_width,
            queue: VecDeque::new(),
            enabled: false,
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Phase 0: move up to `fetch_width` instructions out of the fetch queue,
    /// FIFO order preserved, stamping each dispatch cycle.
    pub fn take_fetched(
        &mut self,
        fetcher: &mut Fetcher,
        clk: u64,
        log: &mut Option<EventLog>,
    ) -> Result<(), SimError> {
        if !self.enabled {
            return Ok(());
        }
        for _ in 0..self.fetch_width {
            let Some(mut inst) = fetcher.queue.pop_front() else {
                break;
            };
            inst.dispatched = Some(clk);
            event_log::record(log, clk, Stage::Dispatched, inst.tag)?;
            self.queue.push_back(inst);
        }
        Ok(())
    }

    /// Phase 1: mark allocatable every station slot that is empty or whose
    /// occupant retires at the end of this cycle. Runs one micro-phase after
    /// the move so fills only ever see marks from the previous cycle, like a
    /// synchronous register-file update.
    pub fn allocate_ready(&self, station: &mut ReservationStation) {
        if !self.enabled {
            return;
        }
        station.refresh_allocatable();
    }
}

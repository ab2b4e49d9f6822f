use log::debug;

use crate::common_data_bus::CommonDataBus;
use crate::config::ProcConfig;
use crate::dispatcher::Dispatcher;
use crate::error::SimError;
use crate::event_log::EventLog;
use crate::execution_units::{self, UnitBank};
use crate::fetcher::Fetcher;
use crate::instruction::{Instruction, UnitClass};
use crate::reorder_buffer::ReorderLedger;
use crate::reservation_station::ReservationStation;
use crate::stats::StatsTracker;
use crate::trace::TraceSource;

/// Everything a finished run reports: aggregate throughput statistics plus
/// per-instruction stage timestamps in retirement (tag) order.
#[derive(Debug)]
pub struct SimSummary {
    pub stats: StatsTracker,
    pub retired: Vec<Instruction>,
}

/// The pipeline driver. Exclusively owns every structure and advances the
/// whole core one clock at a time as three ordered micro-phases; within a
/// phase, stages run in reverse pipeline order so each one reads the state a
/// later stage committed last cycle, emulating synchronous-register
/// semantics without a two-buffer swap.
pub struct Processor {
    config: ProcConfig,
    clk: u64,
    next_tag: u64,
    fired_total: u64,
    retired_total: u64,
    fetcher: Fetcher,
    dispatcher: Dispatcher,
    station: ReservationStation,
    banks: [UnitBank; 3],
    bus: CommonDataBus,
    ledger: ReorderLedger,
    stats: StatsTracker,
    event_log: Option<EventLog>,
}
impl Processor {
    pub fn new(config: ProcConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            clk: 1,
            next_tag: 1,
            fired_total: 0,
            retired_total: 0,
            fetcher: Fetcher::new(config.fetch_width),
            dispatcher: Dispatcher::new(config.fetch_width),
            station: ReservationStation::new(config.station_capacity()),
            banks: [
                UnitBank::new(UnitClass::K0, config.unit_counts[0]),
                UnitBank::new(UnitClass::K1, config.unit_counts[1]),
                UnitBank::new(UnitClass::K2, config.unit_counts[2]),
            ],
            bus: CommonDataBus::new(config.bus_width),
            ledger: ReorderLedger::new(),
            stats: StatsTracker::new(),
            event_log: None,
            config,
        })
    }

    /// Attach a per-instruction event log before running.
    pub fn with_event_log(mut self, log: EventLog) -> Self {
        self.event_log = Some(log);
        self
    }

    /// Run to drain: the trace is exhausted and every issued tag has been
    /// reported in retirement order. Statistics are resampled every cycle.
    pub fn run<S: TraceSource>(mut self, source: &mut S) -> Result<SimSummary, SimError> {
        let mut retired = Vec::new();
        loop {
            for phase in 0..3 {
                self.step(source, phase, &mut retired)?;
            }

            self.stats.update(
                self.clk,
                self.fired_total,
                self.retired_total,
                self.dispatcher.len(),
            );

            let issued = self.next_tag - 1;
            if self.fetcher.is_exhausted() && self.retired_total == issued {
                break;
            }
            self.clk += 1;
        }
        Ok(SimSummary {
            stats: self.stats,
            retired,
        })
    }

    /// One micro-phase across the whole core, retirement side first.
    fn step<S: TraceSource>(
        &mut self,
        source: &mut S,
        phase: u8,
        retired: &mut Vec<Instruction>,
    ) -> Result<(), SimError> {
        match phase {
            0 => {
                self.bus
                    .collect(&mut self.banks, &mut self.station, self.clk, &mut self.event_log)?;
                self.station
                    .issue(&mut self.banks, self.clk, &mut self.event_log)?;
                self.station.fill(
                    &mut self.dispatcher.queue,
                    self.config.fetch_width,
                    self.clk,
                    &mut self.event_log,
                )?;
                self.dispatcher
                    .take_fetched(&mut self.fetcher, self.clk, &mut self.event_log)?;
                let fetched =
                    self.fetcher
                        .fetch(source, self.clk, &mut self.next_tag, &mut self.event_log)?;
                if fetched > 0 {
                    self.dispatcher.enable();
                }
            }
            1 => {
                self.append_and_report(retired);
                execution_units::select_for_broadcast(&mut self.banks, self.config.bus_width);
                self.station.normalize_classes(&self.banks)?;
                self.station.discover_dependencies();
                self.station.resolve_dependencies();
                self.station
                    .wake_up(&self.banks, self.clk, &mut self.fired_total);
                self.dispatcher.allocate_ready(&mut self.station);
            }
            _ => {
                // reclaim first, then flag this cycle's bus results: a slot
                // marked now survives one more cycle for dependents to see
                self.station.reclaim_retired();
                for lane in 0..self.bus.width() {
                    let Some(slot) = self.bus.lanes[lane] else {
                        continue;
                    };
                    self.station.mark_retiring(slot.station);
                    self.retired_total += 1;
                }
                self.bus.clear();
            }
        }
        Ok(())
    }

    /// Phase 1 retirement side: everything on the bus this cycle joins the
    /// ledger, then the reporter emits instructions strictly in tag order.
    fn append_and_report(&mut self, retired: &mut Vec<Instruction>) {
        for lane in 0..self.bus.width() {
            let Some(slot) = self.bus.lanes[lane] else {
                continue;
            };
            if let Some(inst) = self.station.instruction(slot.station).copied() {
                self.ledger.push(inst);
            }
        }
        for inst in self.ledger.drain_in_order() {
            debug!("cycle {}: retired tag {}", self.clk, inst.tag);
            retired.push(inst);
        }
    }
}

use crate::error::SimError;
use crate::event_log::{self, EventLog, Stage};
use crate::execution_units::{UnitBank, UnitSlot};
use crate::reservation_station::ReservationStation;

/// Width-limited broadcast lanes. Lane contents are transient: filled at
/// phase 0, read by retirement at phases 1 and 2, cleared before the next
/// cycle. The lanes only exist to decouple "oldest result selected" from
/// "unit freed".
pub struct CommonDataBus {
    pub lanes: Vec<Option<UnitSlot>>,
}
impl CommonDataBus {
    pub fn new(width: usize) -> Self {
        Self {
            lanes: vec![None; width],
        }
    }

    pub fn width(&self) -> usize {
        self.lanes.len()
    }

    /// Phase 0: each lane takes the globally oldest result marked for
    /// broadcast and frees its unit; the owning station slot gets its
    /// completion stamp. At most `width` results become visible per cycle,
    /// older instructions first.
    pub fn collect(
        &mut self,
        banks: &mut [UnitBank; 3],
        station: &mut ReservationStation,
        clk: u64,
        log: &mut Option<EventLog>,
    ) -> Result<(), SimError> {
        for lane in 0..self.lanes.len() {
            let mut oldest: Option<(u64, usize, usize)> = None;
            for (k, bank) in banks.iter().enumerate() {
                for (u, entry) in bank.units.iter().enumerate() {
                    let Some(slot) = entry else {
                        continue;
                    };
                    if !slot.broadcast {
                        continue;
                    }
                    if oldest.map_or(true, |(tag, _, _)| slot.tag < tag) {
                        oldest = Some((slot.tag, k, u));
                    }
                }
            }
            let Some((_, k, u)) = oldest else {
                break;
            };
            if let Some(slot) = banks[k].units[u].take() {
                station.stamp_completed(slot.station, clk);
                event_log::record(log, clk, Stage::StateUpdate, slot.tag)?;
                self.lanes[lane] = Some(slot);
            }
        }
        Ok(())
    }

    /// End of cycle: the lanes are per-cycle copies, nothing reads them after
    /// retirement has run.
    pub fn clear(&mut self) {
        for lane in &mut self.lanes {
            *lane = None;
        }
    }
}

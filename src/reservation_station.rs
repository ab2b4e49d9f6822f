use std::collections::VecDeque;

use log::{debug, trace};

use crate::error::SimError;
use crate::event_log::{self, EventLog, Stage};
use crate::execution_units::{UnitBank, UnitSlot};
use crate::instruction::{Instruction, UnitClass};

/// One station entry. `inst` doubles as the busy mask; `allocatable` is the
/// separate "may be filled next fill phase" mark, set one micro-phase after
/// the occupant frees so allocation behaves like a synchronous register.
#[derive(Debug, Default)]
pub struct StationSlot {
    pub inst: Option<Instruction>,
    pub allocatable: bool,
}

/// Fixed-capacity reservation station. RAW-hazard discovery, dependency
/// resolution and wake-up/select all live here. Slots are logical states over
/// fixed positions: instructions and functional units refer to them by index,
/// never by pointer.
pub struct ReservationStation {
    pub slots: Vec<StationSlot>,
}
impl ReservationStation {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(capacity, StationSlot::default);
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.inst.is_some()).count()
    }

    pub fn instruction(&self, index: usize) -> Option<&Instruction> {
        self.slots[index].inst.as_ref()
    }

    /// Phase 1 (dispatch side): empty slots and slots whose occupant retires
    /// this cycle become allocatable.
    pub fn refresh_allocatable(&mut self) {
        for slot in &mut self.slots {
            match &slot.inst {
                None => slot.allocatable = true,
                Some(inst) if inst.retiring => slot.allocatable = true,
                Some(_) => {}
            }
        }
    }

    /// Phase 0: pop the dispatch queue into allocatable slots in ascending
    /// index order, at most `fill_width` per cycle (a bounded allocation port
    /// count equal to the fetch width). A full station just fills fewer.
    pub fn fill(
        &mut self,
        queue: &mut VecDeque<Instruction>,
        fill_width: usize,
        clk: u64,
        log: &mut Option<EventLog>,
    ) -> Result<(), SimError> {
        let mut filled = 0;
        for slot in self.slots.iter_mut() {
            if filled == fill_width || queue.is_empty() {
                break;
            }
            if !slot.allocatable {
                continue;
            }
            let Some(mut inst) = queue.pop_front() else {
                break;
            };
            inst.scheduled = Some(clk);
            event_log::record(log, clk, Stage::Scheduled, inst.tag)?;
            trace!("cycle {clk}: scheduled tag {}", inst.tag);
            slot.inst = Some(inst);
            slot.allocatable = false;
            filled += 1;
        }
        Ok(())
    }

    /// Phase 1 step 1: default an unset unit class to class 0. An instruction
    /// whose class has zero configured units could never be selected, so that
    /// is a configuration error surfaced now rather than a silent hang.
    pub fn normalize_classes(&mut self, banks: &[UnitBank; 3]) -> Result<(), SimError> {
        for slot in &mut self.slots {
            let Some(inst) = slot.inst.as_mut() else {
                continue;
            };
            let class = *inst.class.get_or_insert(UnitClass::K0);
            if banks[class.index()].capacity() == 0 {
                return Err(SimError::StarvedClass {
                    class,
                    tag: inst.tag,
                });
            }
        }
        Ok(())
    }

    /// Phase 1 step 2: record RAW hazards. For each operand of each live,
    /// non-retiring consumer, the producer is the largest-tag older
    /// instruction writing that register among the slots scanned before the
    /// consumer; the two operands are searched and set independently. This
    /// is last-writer-wins: a consumer waits on the nearest preceding
    /// producer of its source register, without a register file.
    pub fn discover_dependencies(&mut self) {
        for i in 0..self.slots.len() {
            let Some(consumer) = self.slots[i].inst else {
                continue;
            };
            if consumer.retiring {
                continue;
            }

            // best (producer tag, producer slot) per operand
            let mut best: [Option<(u64, usize)>; 2] = [None, None];
            for j in 0..i {
                let Some(producer) = self.slots[j].inst.as_ref() else {
                    continue;
                };
                if producer.retiring || producer.tag >= consumer.tag {
                    continue;
                }
                let Some(dest) = producer.dest else {
                    continue;
                };
                for k in 0..2 {
                    if consumer.dep[k].is_some() || consumer.src[k] != Some(dest) {
                        continue;
                    }
                    if best[k].map_or(true, |(tag, _)| producer.tag > tag) {
                        best[k] = Some((producer.tag, j));
                    }
                }
            }

            if let Some(inst) = self.slots[i].inst.as_mut() {
                for k in 0..2 {
                    if let Some((tag, j)) = best[k] {
                        inst.dep[k] = Some(j);
                        trace!(
                            "tag {} operand {k} waits on tag {tag} in slot {j}",
                            inst.tag
                        );
                    }
                }
            }
        }
    }

    /// Phase 1 step 3: an operand is available once its producer's slot has
    /// been marked to retire. A reclaimed slot counts as available too; its
    /// value went over the bus long ago.
    pub fn resolve_dependencies(&mut self) {
        for i in 0..self.slots.len() {
            for k in 0..2 {
                let Some(j) = self.slots[i].inst.as_ref().and_then(|inst| inst.dep[k]) else {
                    continue;
                };
                let produced = match &self.slots[j].inst {
                    Some(producer) => producer.retiring,
                    None => true,
                };
                if produced {
                    if let Some(inst) = self.slots[i].inst.as_mut() {
                        inst.dep[k] = None;
                    }
                }
            }
        }
    }

    /// Phase 1 step 4: wake-up/select. Every free (or broadcasting, hence
    /// freeing next cycle) unit takes the oldest eligible instruction of its
    /// class: live, not yet fired, both operands available. At most one
    /// instruction binds per unit per cycle; no eligible slot is simply a
    /// stall, never an error.
    ///
    /// Selection is by tag, not slot index, so an older ready instruction is
    /// never passed over because of slot placement.
    pub fn wake_up(&mut self, banks: &[UnitBank; 3], clk: u64, fired_total: &mut u64) {
        for (k, bank) in banks.iter().enumerate() {
            for u in 0..bank.capacity() {
                if !bank.is_available(u) {
                    continue;
                }

                let mut pick: Option<(u64, usize)> = None;
                for (i, slot) in self.slots.iter().enumerate() {
                    let Some(inst) = slot.inst.as_ref() else {
                        continue;
                    };
                    if inst.class.map_or(true, |class| class.index() != k) {
                        continue;
                    }
                    if inst.fired || !inst.operands_ready() {
                        continue;
                    }
                    if pick.map_or(true, |(tag, _)| inst.tag < tag) {
                        pick = Some((inst.tag, i));
                    }
                }

                if let Some((tag, i)) = pick {
                    if let Some(inst) = self.slots[i].inst.as_mut() {
                        inst.fired = true;
                        inst.unit = Some(u);
                        *fired_total += 1;
                        debug!("cycle {clk}: tag {tag} fired to class {k} unit {u}");
                    }
                }
            }
        }
    }

    /// Phase 0 (execute side): copy every fired, not-yet-issued instruction
    /// into the unit it was bound to and stamp its execute cycle.
    pub fn issue(
        &mut self,
        banks: &mut [UnitBank; 3],
        clk: u64,
        log: &mut Option<EventLog>,
    ) -> Result<(), SimError> {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let Some(inst) = slot.inst.as_mut() else {
                continue;
            };
            if !inst.fired || inst.executed.is_some() {
                continue;
            }
            let (Some(class), Some(unit)) = (inst.class, inst.unit) else {
                continue;
            };
            banks[class.index()].load(
                unit,
                UnitSlot {
                    tag: inst.tag,
                    station: i,
                    dest: inst.dest,
                    broadcast: false,
                },
            );
            inst.executed = Some(clk);
            event_log::record(log, clk, Stage::Executed, inst.tag)?;
        }
        Ok(())
    }

    /// Stamp the completion cycle of a slot's occupant when its result lands
    /// on the bus.
    pub fn stamp_completed(&mut self, index: usize, clk: u64) {
        if let Some(inst) = self.slots[index].inst.as_mut() {
            inst.completed = Some(clk);
        }
    }

    /// Flag a slot's occupant to retire; it frees at the end of next cycle.
    pub fn mark_retiring(&mut self, index: usize) {
        if let Some(inst) = self.slots[index].inst.as_mut() {
            inst.retiring = true;
        }
    }

    /// Phase 2: slots whose occupant was flagged to retire go back to empty
    /// and allocatable.
    pub fn reclaim_retired(&mut self) {
        for slot in &mut self.slots {
            if slot.inst.as_ref().is_some_and(|inst| inst.retiring) {
                slot.inst = None;
                slot.allocatable = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceInst;

    fn inst(tag: u64, dest: Option<u32>, src: [Option<u32>; 2]) -> Instruction {
        let mut inst = Instruction::from_trace(
            tag,
            &TraceInst {
                address: 0x100 + tag,
                class: Some(UnitClass::K0),
                src,
                dest,
            },
        );
        inst.fetched = Some(1);
        inst
    }

    fn station_with(insts: Vec<Instruction>) -> ReservationStation {
        let mut station = ReservationStation::new(insts.len().max(4));
        for (slot, inst) in station.slots.iter_mut().zip(insts) {
            slot.inst = Some(inst);
        }
        station
    }

    #[test]
    fn nearest_older_producer_wins() {
        // two producers of r5, the consumer must wait on the later one
        let mut station = station_with(vec![
            inst(1, Some(5), [None, None]),
            inst(2, Some(5), [None, None]),
            inst(3, None, [Some(5), None]),
        ]);
        station.discover_dependencies();

        let consumer = station.instruction(2).unwrap();
        assert_eq!(consumer.dep, [Some(1), None]);
    }

    #[test]
    fn operands_are_tracked_independently() {
        let mut station = station_with(vec![
            inst(1, Some(1), [None, None]),
            inst(2, Some(2), [None, None]),
            inst(3, None, [Some(1), Some(2)]),
        ]);
        station.discover_dependencies();

        let consumer = station.instruction(2).unwrap();
        assert_eq!(consumer.dep, [Some(0), Some(1)]);
    }

    #[test]
    fn younger_slot_is_never_a_producer() {
        // slot order equals scan order: a producer placed after the consumer
        // is outside the scan window, and a larger tag is rejected outright
        let mut station = station_with(vec![
            inst(2, None, [Some(7), None]),
            inst(3, Some(7), [None, None]),
        ]);
        station.discover_dependencies();

        assert_eq!(station.instruction(0).unwrap().dep, [None, None]);
    }

    #[test]
    fn dependency_resolves_only_when_producer_retires() {
        let mut station = station_with(vec![
            inst(1, Some(5), [None, None]),
            inst(2, None, [Some(5), None]),
        ]);
        station.discover_dependencies();
        assert_eq!(station.instruction(1).unwrap().dep[0], Some(0));

        station.resolve_dependencies();
        assert_eq!(station.instruction(1).unwrap().dep[0], Some(0));

        station.mark_retiring(0);
        station.resolve_dependencies();
        assert_eq!(station.instruction(1).unwrap().dep[0], None);
    }

    #[test]
    fn wake_up_prefers_the_oldest_eligible_tag() {
        // older instruction sits in a higher slot; tag order must still win
        let mut station = station_with(vec![
            inst(4, Some(1), [None, None]),
            inst(2, Some(2), [None, None]),
        ]);
        let banks = [
            UnitBank::new(UnitClass::K0, 1),
            UnitBank::new(UnitClass::K1, 0),
            UnitBank::new(UnitClass::K2, 0),
        ];

        let mut fired = 0;
        station.wake_up(&banks, 1, &mut fired);

        assert_eq!(fired, 1);
        assert!(!station.instruction(0).unwrap().fired);
        assert!(station.instruction(1).unwrap().fired);
        assert_eq!(station.instruction(1).unwrap().unit, Some(0));
    }

    #[test]
    fn wake_up_skips_instructions_with_outstanding_dependencies() {
        let mut station = station_with(vec![
            inst(1, Some(5), [None, None]),
            inst(2, None, [Some(5), None]),
        ]);
        station.discover_dependencies();

        let banks = [
            UnitBank::new(UnitClass::K0, 2),
            UnitBank::new(UnitClass::K1, 0),
            UnitBank::new(UnitClass::K2, 0),
        ];
        let mut fired = 0;
        station.wake_up(&banks, 1, &mut fired);

        assert!(station.instruction(0).unwrap().fired);
        assert!(!station.instruction(1).unwrap().fired);
        assert_eq!(fired, 1);
    }

    #[test]
    fn reclaim_frees_only_retiring_slots() {
        let mut station = station_with(vec![
            inst(1, Some(1), [None, None]),
            inst(2, Some(2), [None, None]),
        ]);
        station.mark_retiring(0);
        station.reclaim_retired();

        assert!(station.instruction(0).is_none());
        assert!(station.slots[0].allocatable);
        assert!(station.instruction(1).is_some());
        assert_eq!(station.occupied(), 1);
    }

    #[test]
    fn starved_class_is_a_hard_error() {
        let mut station = ReservationStation::new(4);
        let mut starved = inst(1, Some(1), [None, None]);
        starved.class = Some(UnitClass::K1);
        station.slots[0].inst = Some(starved);

        let banks = [
            UnitBank::new(UnitClass::K0, 1),
            UnitBank::new(UnitClass::K1, 0),
            UnitBank::new(UnitClass::K2, 1),
        ];
        let err = station.normalize_classes(&banks).unwrap_err();
        assert!(matches!(
            err,
            SimError::StarvedClass {
                class: UnitClass::K1,
                tag: 1
            }
        ));
    }

    #[test]
    fn unset_class_normalizes_to_class_zero() {
        let mut station = ReservationStation::new(4);
        let mut blank = inst(1, None, [None, None]);
        blank.class = None;
        station.slots[0].inst = Some(blank);

        let banks = [
            UnitBank::new(UnitClass::K0, 1),
            UnitBank::new(UnitClass::K1, 0),
            UnitBank::new(UnitClass::K2, 0),
        ];
        station.normalize_classes(&banks).unwrap();
        assert_eq!(station.instruction(0).unwrap().class, Some(UnitClass::K0));
    }
}

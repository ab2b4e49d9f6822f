use crate::instruction::UnitClass;

/// One in-flight execution record. Only identity and routing survive here:
/// the tag, the destination register and the station slot the instruction
/// came from, referenced by index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitSlot {
    pub tag: u64,
    /// Back-reference to the owning reservation-station slot.
    pub station: usize,
    pub dest: Option<u32>,
    /// Result selected for the bus; the unit frees when a lane collects it.
    pub broadcast: bool,
}

/// Bank of identical one-cycle-latency functional units for a single class.
/// A `None` entry is a free unit.
pub struct UnitBank {
    class: UnitClass,
    pub units: Vec<Option<UnitSlot>>,
}
impl UnitBank {
    pub fn new(class: UnitClass, count: usize) -> Self {
        Self {
            class,
            units: vec![None; count],
        }
    }

    pub fn class(&self) -> UnitClass {
        self.class
    }

    pub fn capacity(&self) -> usize {
        self.units.len()
    }

    /// Free now, or broadcasting and therefore free by the time issue copies
    /// the next instruction in.
    pub fn is_available(&self, unit: usize) -> bool {
        self.units[unit].map_or(true, |slot| slot.broadcast)
    }

    pub fn load(&mut self, unit: usize, slot: UnitSlot) {
        self.units[unit] = Some(slot);
    }
}

/// Phase 1 (execute side): mark up to `bus_width` finished results for
/// broadcast, globally oldest tag first across all three banks. Units left
/// unmarked stay busy and wait for a later cycle; that is bus contention,
/// not an error.
pub fn select_for_broadcast(banks: &mut [UnitBank; 3], bus_width: usize) {
    for _ in 0..bus_width {
        let mut oldest: Option<(u64, usize, usize)> = None;
        for (k, bank) in banks.iter().enumerate() {
            for (u, entry) in bank.units.iter().enumerate() {
                let Some(slot) = entry else {
                    continue;
                };
                if slot.broadcast {
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
        if let Some(slot) = banks[k].units[u].as_mut() {
            slot.broadcast = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(tag: u64, station: usize) -> UnitSlot {
        UnitSlot {
            tag,
            station,
            dest: None,
            broadcast: false,
        }
    }

    fn banks() -> [UnitBank; 3] {
        [
            UnitBank::new(UnitClass::K0, 2),
            UnitBank::new(UnitClass::K1, 1),
            UnitBank::new(UnitClass::K2, 1),
        ]
    }

    #[test]
    fn broadcast_selection_is_oldest_first_across_banks() {
        let mut banks = banks();
        banks[0].load(0, slot(5, 0));
        banks[1].load(0, slot(2, 1));
        banks[2].load(0, slot(9, 2));

        select_for_broadcast(&mut banks, 2);

        assert!(banks[1].units[0].unwrap().broadcast);
        assert!(banks[0].units[0].unwrap().broadcast);
        assert!(!banks[2].units[0].unwrap().broadcast);
    }

    #[test]
    fn selection_never_exceeds_the_bus_width() {
        let mut banks = banks();
        banks[0].load(0, slot(1, 0));
        banks[0].load(1, slot(2, 1));
        banks[1].load(0, slot(3, 2));

        select_for_broadcast(&mut banks, 1);

        let marked = banks
            .iter()
            .flat_map(|bank| bank.units.iter())
            .filter(|entry| entry.is_some_and(|slot| slot.broadcast))
            .count();
        assert_eq!(marked, 1);
        assert!(banks[0].units[0].unwrap().broadcast);
    }

    #[test]
    fn broadcasting_unit_counts_as_available() {
        let mut bank = UnitBank::new(UnitClass::K0, 1);
        assert!(bank.is_available(0));

        bank.load(0, slot(1, 0));
        assert!(!bank.is_available(0));

        if let Some(slot) = bank.units[0].as_mut() {
            slot.broadcast = true;
        }
        assert!(bank.is_available(0));
    }
}

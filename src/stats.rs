use core::fmt::{self, Display};

/// Running throughput statistics. The driver samples these once per cycle,
/// so the averages are valid mid-run, not only at the end.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsTracker {
    pub cycles: u64,
    pub retired_instructions: u64,
    pub avg_fired_per_cycle: f64,
    pub avg_retired_per_cycle: f64,
    pub avg_dispatch_queue: f64,
    pub max_dispatch_queue: usize,
    dispatch_size_sum: u64,
}
impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once per cycle, after phase 2, with the cycle's committed state.
    pub fn update(&mut self, cycle: u64, fired_total: u64, retired_total: u64, dispatch_len: usize) {
        self.cycles = cycle;
        self.retired_instructions = retired_total;
        self.dispatch_size_sum += dispatch_len as u64;
        self.avg_fired_per_cycle = fired_total as f64 / cycle as f64;
        self.avg_retired_per_cycle = retired_total as f64 / cycle as f64;
        self.avg_dispatch_queue = self.dispatch_size_sum as f64 / cycle as f64;
        self.max_dispatch_queue = self.max_dispatch_queue.max(dispatch_len);
    }
}
impl Display for StatsTracker {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Processor stats:")?;
        writeln!(f, " - Cycles: {}", self.cycles)?;
        writeln!(f, " - Instructions Retired: {}", self.retired_instructions)?;
        writeln!(
            f,
            " - Avg Instructions Fired/Cycle: {:.2}",
            self.avg_fired_per_cycle
        )?;
        writeln!(
            f,
            " - Avg Instructions Retired/Cycle: {:.2}",
            self.avg_retired_per_cycle
        )?;
        writeln!(
            f,
            " - Avg Dispatch Queue Size: {:.2}",
            self.avg_dispatch_queue
        )?;
        writeln!(f, " - Max Dispatch Queue Size: {}", self.max_dispatch_queue)
    }
}

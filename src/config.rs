use crate::error::ConfigError;

/// Core geometry, fixed for a whole run. The reservation station is not
/// sized independently: the design fixes it at twice the total functional-unit
/// count, enough in-flight buffering relative to execution bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcConfig {
    /// Common-data-bus lanes, the number of results made visible per cycle.
    pub bus_width: usize,
    /// Functional units for classes 0, 1 and 2.
    pub unit_counts: [usize; 3],
    /// Instructions fetched (and dispatched, and scheduled) per cycle.
    pub fetch_width: usize,
}
impl ProcConfig {
    /// Widths must be positive and at least one unit must exist somewhere.
    /// A single class with zero units stays legal here; starvation on such a
    /// class is detected at runtime when an instruction actually needs it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_width == 0 {
            return Err(ConfigError::ZeroFetchWidth);
        }
        if self.bus_width == 0 {
            return Err(ConfigError::ZeroBusWidth);
        }
        if self.unit_counts.iter().all(|&k| k == 0) {
            return Err(ConfigError::NoUnits);
        }
        Ok(())
    }

    pub fn station_capacity(&self) -> usize {
        2 * self.unit_counts.iter().sum::<usize>()
    }
}
impl Default for ProcConfig {
    fn default() -> Self {
        Self {
            bus_width: 2,
            unit_counts: [3, 2, 1],
            fetch_width: 4,
        }
    }
}

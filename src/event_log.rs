use std::fmt;
use std::io::{self, Write};

/// Stage transitions as they appear in the log's OPERATION column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetched,
    Dispatched,
    Scheduled,
    Executed,
    StateUpdate,
}
impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetched => "FETCHED",
            Stage::Dispatched => "DISPATCHED",
            Stage::Scheduled => "SCHEDULED",
            Stage::Executed => "EXECUTED",
            Stage::StateUpdate => "STATE UPDATE",
        };
        f.write_str(name)
    }
}

/// Tab-separated per-instruction event stream, one row per stage transition,
/// written the moment each timestamp is taken.
pub struct EventLog {
    out: Box<dyn Write>,
}
impl EventLog {
    pub fn new(mut out: Box<dyn Write>) -> io::Result<Self> {
        writeln!(out, "CYCLE\tOPERATION\tINSTRUCTION")?;
        Ok(Self { out })
    }

    pub fn record(&mut self, cycle: u64, stage: Stage, tag: u64) -> io::Result<()> {
        writeln!(self.out, "{cycle}\t{stage}\t{tag}")
    }
}

/// Stage code calls this with the driver's optional log so the disabled case
/// stays a no-op.
pub fn record(log: &mut Option<EventLog>, cycle: u64, stage: Stage, tag: u64) -> io::Result<()> {
    match log {
        Some(log) => log.record(cycle, stage, tag),
        None => Ok(()),
    }
}

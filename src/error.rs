use thiserror::Error;

use crate::instruction::UnitClass;

/// Rejected core geometry, caught before the simulation starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("fetch width must be at least 1")]
    ZeroFetchWidth,
    #[error("result bus width must be at least 1")]
    ZeroBusWidth,
    #[error("at least one functional unit is required across the three classes")]
    NoUnits,
}

/// A trace record the reader could not turn into an instruction.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace line {line}: malformed record {text:?}")]
    Malformed { line: usize, text: String },
    #[error("trace line {line}: functional-unit class {found} is outside -1..=2")]
    BadClass { line: usize, found: i64 },
    #[error("trace line {line}: {source}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that can stop a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Trace(#[from] TraceError),
    /// The trace needs a unit class the configuration has zero units for.
    /// Such an instruction can never be selected, so the run would otherwise
    /// spin forever.
    #[error("instruction {tag} needs a class-{class:?} functional unit but none are configured")]
    StarvedClass { class: UnitClass, tag: u64 },
    #[error("failed to write event log")]
    EventLog(#[from] std::io::Error),
}

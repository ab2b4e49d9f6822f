//! Cycle-accurate timing simulator for an out-of-order superscalar core.
//!
//! The pipeline models fetch, dispatch, reservation-station scheduling with
//! RAW-hazard tracking, multi-class functional-unit execution, common-data-bus
//! broadcast arbitration and in-order retirement. Each simulated clock is
//! stepped as three ordered micro-phases, with stage logic invoked in reverse
//! pipeline order so every stage reads the state committed by the previous
//! cycle. No data values are modelled, only structural and data-hazard timing.

pub mod common_data_bus;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event_log;
pub mod execution_units;
pub mod fetcher;
pub mod instruction;
pub mod processor;
pub mod reorder_buffer;
pub mod reservation_station;
pub mod stats;
pub mod trace;

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use oosim::config::ProcConfig;
use oosim::event_log::EventLog;
use oosim::processor::Processor;
use oosim::trace::TraceReader;

/// Cycle-accurate out-of-order superscalar pipeline timing simulator.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Instruction trace file; reads stdin when omitted
    trace: Option<PathBuf>,

    /// Result-bus (CDB) width
    #[arg(short = 'r', long, default_value_t = 2)]
    bus_width: usize,

    /// Number of class-0 functional units
    #[arg(short = 'j', long, default_value_t = 3)]
    k0: usize,

    /// Number of class-1 functional units
    #[arg(short = 'k', long, default_value_t = 2)]
    k1: usize,

    /// Number of class-2 functional units
    #[arg(short = 'l', long, default_value_t = 1)]
    k2: usize,

    /// Instructions fetched per cycle
    #[arg(short = 'f', long, default_value_t = 4)]
    fetch_width: usize,

    /// Write a per-instruction event log to this file
    #[arg(long)]
    log: Option<PathBuf>,

    /// Print per-instruction stage timestamps in retirement order
    #[arg(long)]
    debug: bool,
}
impl From<&Args> for ProcConfig {
    fn from(args: &Args) -> Self {
        Self {
            bus_width: args.bus_width,
            unit_counts: [args.k0, args.k1, args.k2],
            fetch_width: args.fetch_width,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut processor = Processor::new(ProcConfig::from(&args))?;
    if let Some(path) = &args.log {
        let file = File::create(path)
            .with_context(|| format!("creating event log {}", path.display()))?;
        processor = processor.with_event_log(EventLog::new(Box::new(BufWriter::new(file)))?);
    }

    let summary = match &args.trace {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("opening trace {}", path.display()))?;
            let mut reader = TraceReader::new(BufReader::new(file));
            processor.run(&mut reader)?
        }
        None => {
            let mut reader = TraceReader::new(io::stdin().lock());
            processor.run(&mut reader)?
        }
    };

    if args.debug {
        println!("INST\tFETCH\tDISP\tSCHED\tEXEC\tSTATE");
        for inst in &summary.retired {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                inst.tag,
                stamp(inst.fetched),
                stamp(inst.dispatched),
                stamp(inst.scheduled),
                stamp(inst.executed),
                stamp(inst.completed),
            );
        }
    }
    print!("{}", summary.stats);
    Ok(())
}

fn stamp(cycle: Option<u64>) -> i64 {
    cycle.map_or(-1, |c| c as i64)
}

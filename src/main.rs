//! gatesim - digital logic circuit simulator
//!
//! Parses a circuit definition file, runs the network for a number of
//! steps, and prints each monitor trace as a waveform line.
//!
//! # Usage
//!
//! ```bash
//! gatesim circuit.txt --steps 40
//! ```
//!
//! Exit codes: 0 on success, 1 if the definition file has errors, 2 if the
//! network oscillates, 64 for usage problems.

use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use gatesim_core::{dsl, Simulator};

/// sysexits EX_USAGE
const USAGE_ERROR: i32 = 64;

/// Digital logic circuit simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the circuit definition file
    #[arg(value_name = "CIRCUIT_FILE")]
    circuit_file: PathBuf,

    /// Number of simulation steps to run
    #[arg(short, long, default_value_t = 20)]
    steps: usize,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = match err.kind() {
                clap::error::ErrorKind::DisplayHelp
                | clap::error::ErrorKind::DisplayVersion => 0,
                _ => USAGE_ERROR,
            };
            let _ = err.print();
            exit(code);
        }
    };

    simple_logger::SimpleLogger::new()
        .with_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init()
        .ok();

    let source = match std::fs::read_to_string(&args.circuit_file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!(
                "error: cannot read '{}': {err}",
                args.circuit_file.display()
            );
            exit(USAGE_ERROR);
        }
    };

    let (network, diagnostics) = dsl::parse(&source);
    if !diagnostics.is_empty() {
        eprintln!("{diagnostics}");
        exit(1);
    }

    let mut simulator = Simulator::new(network);
    if let Err(err) = simulator.run(args.steps) {
        eprintln!("error: {err}");
        exit(2);
    }

    let width = simulator
        .monitors()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);
    for (name, trace) in simulator.monitors() {
        let wave: String = trace.iter().map(|signal| signal.glyph()).collect();
        println!("{name:<width$}  {wave}");
    }
}

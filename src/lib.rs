//! # Gatesim Core
//!
//! A digital-logic circuit simulator driven by a text definition language.
//!
//! This library provides:
//! - A scanner and recursive-descent parser for the definition language,
//!   with caret-pointer diagnostics and multi-error recovery
//! - A flat network representation of devices, pins and connections
//! - A deterministic stepped simulation kernel with monitor traces
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`dsl`] - Name table, scanner and parser for the definition language
//! - [`circuit`] - Network representation and validation
//! - [`sim`] - The simulation kernel
//! - [`error`] - Diagnostics and runtime errors
//!
//! ## Usage
//!
//! ```no_run
//! use gatesim_core::{dsl, Simulator};
//!
//! let source = std::fs::read_to_string("circuit.txt").unwrap();
//! let (network, diagnostics) = dsl::parse(&source);
//! if !diagnostics.is_empty() {
//!     eprintln!("{diagnostics}");
//!     return;
//! }
//!
//! let mut sim = Simulator::new(network);
//! sim.run(20).unwrap();
//! for (name, trace) in sim.monitors() {
//!     let wave: String = trace.iter().map(|s| s.glyph()).collect();
//!     println!("{name}  {wave}");
//! }
//! ```
//!
//! ## Simulation model
//!
//! Signals are five-valued (`Low`, `High`, `Rising`, `Falling`,
//! `Undefined`). One step advances every clock, re-evaluates combinational
//! gates to a fixed point, latches D-type flip-flops from the settled
//! values, and appends one sample to every monitor trace. A network that
//! cannot settle within `device count + 1` passes fails the step with an
//! oscillation error.

pub mod circuit;
pub mod dsl;
pub mod error;
pub mod sim;

// Re-export main types for convenience
pub use circuit::{Network, Signal};
pub use dsl::parse;
pub use error::{Diagnostics, Result, SimError};
pub use sim::Simulator;

/// Largest accepted fan-in for AND/NAND/OR/NOR gates.
pub const MAX_GATE_INPUTS: u32 = 16;

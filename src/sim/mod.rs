//! The simulation kernel.
//!
//! One step of simulated time is: advance the clocks, propagate signals
//! through the combinational gates until nothing changes, latch the D-type
//! flip-flops from the settled values, demote one-step transients, and
//! sample every monitor point. Propagation is bounded by the device count;
//! a network that is still changing at the bound has a combinational
//! feedback loop and the step fails rather than spinning.

mod simulator;

pub use simulator::Simulator;

//! Network representation and validation.
//!
//! This module provides the in-memory form of a circuit after parsing.
//! The [`Network`] holds all devices, their pins and connections, and the
//! monitor points, in a form suitable for stepped simulation.

mod network;
mod types;
mod validate;

pub use network::{Device, InputPin, Monitor, Network, OutputPin};
pub use types::{DeviceId, DeviceKind, OutputId, Signal};
pub use validate::unconnected_inputs;

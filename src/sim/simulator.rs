//! Main simulator interface.

use log::{debug, warn};

use crate::circuit::{DeviceKind, Network, Signal};
use crate::error::{Result, SimError};

/// Drives a parsed network through discrete time steps and records the
/// monitor traces.
///
/// The simulator owns the network. Topology never changes here; a step
/// mutates only output signals, clock counters and traces. A step is
/// atomic from the caller's point of view: it either completes and appends
/// one sample per monitor, or fails with [`SimError::Oscillation`] leaving
/// the traces untouched at that index.
pub struct Simulator {
    network: Network,
    steps: usize,
}

impl Simulator {
    /// Create a simulator for a network.
    ///
    /// The network should have come out of a parse with zero diagnostics;
    /// everything else is a front-end bug, not a recoverable condition.
    pub fn new(network: Network) -> Self {
        Self { network, steps: 0 }
    }

    /// The network being simulated.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Mutable access, for front-ends adjusting monitors between runs.
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    /// Number of steps completed since construction or the last reset.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Flip a switch by name.
    pub fn set_switch(&mut self, name: &str, level: bool) -> Result<()> {
        self.network.set_switch(name, level)
    }

    /// Monitor labels with their recorded traces, in definition order.
    pub fn monitors(&self) -> impl Iterator<Item = (&str, &[Signal])> {
        self.network
            .monitors
            .iter()
            .map(|m| (m.label.as_str(), m.trace.as_slice()))
    }

    /// Advance the network by one step of simulated time.
    pub fn step(&mut self) -> Result<()> {
        self.advance_clocks();
        self.propagate()?;
        self.latch_dtypes();
        self.settle_transients();
        self.sample_monitors();
        self.steps += 1;
        Ok(())
    }

    /// Run `steps` consecutive steps.
    pub fn run(&mut self, steps: usize) -> Result<()> {
        for _ in 0..steps {
            self.step()?;
        }
        debug!("ran {steps} steps ({} total)", self.steps);
        Ok(())
    }

    /// Restore the power-on state and clear all traces.
    ///
    /// Replaying the same switch settings and steps after a reset yields
    /// identical traces.
    pub fn reset(&mut self) {
        self.network.reset();
        self.steps = 0;
    }

    /// Tick every clock; one that has held its level for its half-period
    /// toggles with a one-step `Rising`/`Falling` edge marker.
    fn advance_clocks(&mut self) {
        for device in &mut self.network.devices {
            let DeviceKind::Clock { half_period } = device.kind else {
                continue;
            };
            if device.clock_counter == half_period {
                device.clock_counter = 0;
                let output = &mut device.outputs[0];
                output.signal = match output.signal.level() {
                    Some(true) => Signal::Falling,
                    _ => Signal::Rising,
                };
            }
            device.clock_counter += 1;
        }
    }

    /// Re-evaluate combinational gates until a pass changes nothing.
    ///
    /// The pass bound of `N_DEV + 1` is enough for any loop-free network;
    /// exhausting it means a combinational feedback loop with no fixed
    /// point. Evaluation within a pass reads current values, so device
    /// order cannot affect the settled result.
    fn propagate(&mut self) -> Result<()> {
        let passes = self.network.devices.len() + 1;
        for _ in 0..passes {
            let mut changed = false;
            for index in 0..self.network.devices.len() {
                if !self.network.devices[index].kind.is_combinational() {
                    continue;
                }
                let new = evaluate_gate(&self.network, index);
                let output = &mut self.network.devices[index].outputs[0];
                if output.signal != new {
                    output.signal = new;
                    changed = true;
                }
            }
            if !changed {
                return Ok(());
            }
        }
        warn!("network still changing after {passes} propagation passes");
        Err(SimError::Oscillation { passes })
    }

    /// Latch every D-type flip-flop, once, from the settled signals.
    ///
    /// CLEAR dominates SET; otherwise Q samples DATA on a rising clock
    /// edge and holds in between. New Q values reach downstream gates on
    /// the next step, which is what makes ripple counters well defined.
    fn latch_dtypes(&mut self) {
        for index in 0..self.network.devices.len() {
            let device = &self.network.devices[index];
            if device.kind != DeviceKind::DType {
                continue;
            }
            let data = self.network.input_signal(&device.inputs[0]);
            let clk = self.network.input_signal(&device.inputs[1]);
            let set = self.network.input_signal(&device.inputs[2]);
            let clear = self.network.input_signal(&device.inputs[3]);

            let (q, qbar) = if clear.level() == Some(true) {
                (Signal::Low, Signal::High)
            } else if set.level() == Some(true) {
                (Signal::High, Signal::Low)
            } else if clk == Signal::Rising {
                match data.level() {
                    Some(true) => (Signal::High, Signal::Low),
                    Some(false) => (Signal::Low, Signal::High),
                    None => (Signal::Undefined, Signal::Undefined),
                }
            } else {
                (device.outputs[0].signal, device.outputs[1].signal)
            };

            let device = &mut self.network.devices[index];
            device.outputs[0].signal = q;
            device.outputs[1].signal = qbar;
        }
    }

    /// Demote `Rising`/`Falling` to their steady levels for the next step.
    fn settle_transients(&mut self) {
        for device in &mut self.network.devices {
            for output in &mut device.outputs {
                output.signal = output.signal.settled();
            }
        }
    }

    fn sample_monitors(&mut self) {
        for index in 0..self.network.monitors.len() {
            let monitor = &self.network.monitors[index];
            let signal = self.network.signal_at(monitor.device, monitor.output);
            self.network.monitors[index].trace.push(signal);
        }
    }
}

/// Compute a gate's new output from its current inputs.
///
/// AND/NAND/OR/NOR follow three-valued logic: a dominating input (a Low
/// into AND, a High into OR) decides the output even when other inputs are
/// still undefined. XOR and NOT need every input defined.
fn evaluate_gate(network: &Network, index: usize) -> Signal {
    let device = &network.devices[index];
    let mut levels = device
        .inputs
        .iter()
        .map(|pin| network.input_signal(pin).level());

    match device.kind {
        DeviceKind::And { .. } => conjunction(levels),
        DeviceKind::Nand { .. } => negate(conjunction(levels)),
        DeviceKind::Or { .. } => disjunction(levels),
        DeviceKind::Nor { .. } => negate(disjunction(levels)),
        DeviceKind::Xor => {
            let mut high = 0usize;
            for level in levels {
                match level {
                    Some(true) => high += 1,
                    Some(false) => {}
                    None => return Signal::Undefined,
                }
            }
            Signal::from_level(high == 1)
        }
        DeviceKind::Not => match levels.next().flatten() {
            Some(level) => Signal::from_level(!level),
            None => Signal::Undefined,
        },
        // sources and flip-flops are not re-evaluated here
        _ => device.outputs[0].signal,
    }
}

fn conjunction(levels: impl Iterator<Item = Option<bool>>) -> Signal {
    let mut undefined = false;
    for level in levels {
        match level {
            Some(false) => return Signal::Low,
            None => undefined = true,
            Some(true) => {}
        }
    }
    if undefined {
        Signal::Undefined
    } else {
        Signal::High
    }
}

fn disjunction(levels: impl Iterator<Item = Option<bool>>) -> Signal {
    let mut undefined = false;
    for level in levels {
        match level {
            Some(true) => return Signal::High,
            None => undefined = true,
            Some(false) => {}
        }
    }
    if undefined {
        Signal::Undefined
    } else {
        Signal::Low
    }
}

fn negate(signal: Signal) -> Signal {
    match signal {
        Signal::High => Signal::Low,
        Signal::Low => Signal::High,
        other => other,
    }
}

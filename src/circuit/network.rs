//! The logic network: devices, pins, connections and monitor points.
//!
//! Devices live in a flat `Vec` addressed by [`DeviceId`]; a connection is
//! recorded as the driving `(device, output)` pair stored on the driven
//! input pin. This keeps the graph free of ownership cycles even though
//! outputs may drive inputs anywhere in the network.

use std::collections::HashMap;

use crate::dsl::{NameId, NameTable};
use crate::error::{Result, SimError};

use super::types::{DeviceId, DeviceKind, OutputId, Signal};

/// An input pin: its name and the output that drives it.
#[derive(Debug, Clone)]
pub struct InputPin {
    pub name: NameId,
    pub driver: Option<(DeviceId, OutputId)>,
}

/// An output pin: its name (`None` for the default output) and its level.
#[derive(Debug, Clone)]
pub struct OutputPin {
    pub name: Option<NameId>,
    pub signal: Signal,
}

/// A named instance of a circuit element.
#[derive(Debug, Clone)]
pub struct Device {
    pub id: DeviceId,
    pub name: NameId,
    pub kind: DeviceKind,
    pub inputs: Vec<InputPin>,
    pub outputs: Vec<OutputPin>,
    /// Steps spent at the current level; meaningful for clocks only.
    pub clock_counter: u32,
}

impl Device {
    fn new(id: DeviceId, name: NameId, kind: DeviceKind, names: &mut NameTable) -> Self {
        let inputs = match kind {
            DeviceKind::DType => ["DATA", "CLK", "SET", "CLEAR"]
                .iter()
                .map(|pin| InputPin {
                    name: names.intern(pin),
                    driver: None,
                })
                .collect(),
            _ => (1..=kind.input_count())
                .map(|i| InputPin {
                    name: names.intern(&format!("I{i}")),
                    driver: None,
                })
                .collect(),
        };
        let outputs = match kind {
            DeviceKind::DType => vec![
                OutputPin {
                    name: Some(names.intern("Q")),
                    signal: Signal::Low,
                },
                OutputPin {
                    name: Some(names.intern("QBAR")),
                    signal: Signal::High,
                },
            ],
            _ => vec![OutputPin {
                name: None,
                signal: Self::source_level(kind),
            }],
        };
        Self {
            id,
            name,
            kind,
            inputs,
            outputs,
            clock_counter: 0,
        }
    }

    /// Power-on level of a single-output device. Gate outputs start Low so
    /// feedback circuits (latches, counters) leave a defined state; an
    /// undefined level in a combinational cycle is a fixed point that the
    /// network could never escape.
    fn source_level(kind: DeviceKind) -> Signal {
        match kind {
            DeviceKind::Switch { initial } => Signal::from_level(initial),
            _ => Signal::Low,
        }
    }

    /// Index of the input pin with the given name.
    pub fn input_index(&self, pin: NameId) -> Option<usize> {
        self.inputs.iter().position(|p| p.name == pin)
    }

    /// Index of an output pin: `None` asks for the default output.
    pub fn output_index(&self, pin: Option<NameId>) -> Option<OutputId> {
        self.outputs
            .iter()
            .position(|p| p.name == pin)
            .map(OutputId)
    }

    /// Restore power-on state. Topology is untouched.
    pub fn reset(&mut self) {
        self.clock_counter = 0;
        match self.kind {
            DeviceKind::DType => {
                self.outputs[0].signal = Signal::Low;
                self.outputs[1].signal = Signal::High;
            }
            _ => self.outputs[0].signal = Self::source_level(self.kind),
        }
    }
}

/// A watched output pin with its display label and recorded trace.
#[derive(Debug, Clone)]
pub struct Monitor {
    pub device: DeviceId,
    pub output: OutputId,
    pub label: String,
    pub trace: Vec<Signal>,
}

/// The complete network built from a definition file.
#[derive(Debug)]
pub struct Network {
    /// Interned names; lives as long as the network.
    pub names: NameTable,
    pub devices: Vec<Device>,
    pub monitors: Vec<Monitor>,
    ids: HashMap<NameId, DeviceId>,
}

impl Network {
    pub fn new() -> Self {
        Self {
            names: NameTable::new(),
            devices: Vec::new(),
            monitors: Vec::new(),
            ids: HashMap::new(),
        }
    }

    /// Allocate a device and its pins. The name must be unused.
    pub fn add_device(&mut self, name: NameId, kind: DeviceKind) -> DeviceId {
        debug_assert!(!self.ids.contains_key(&name));
        let id = DeviceId(self.devices.len());
        self.devices
            .push(Device::new(id, name, kind, &mut self.names));
        self.ids.insert(name, id);
        id
    }

    pub fn device(&self, id: DeviceId) -> &Device {
        &self.devices[id.0]
    }

    pub fn device_mut(&mut self, id: DeviceId) -> &mut Device {
        &mut self.devices[id.0]
    }

    /// Resolve an interned name to a device, if one is defined under it.
    pub fn device_id(&self, name: NameId) -> Option<DeviceId> {
        self.ids.get(&name).copied()
    }

    pub fn driver_of(&self, device: DeviceId, input: usize) -> Option<(DeviceId, OutputId)> {
        self.devices[device.0].inputs[input].driver
    }

    /// Install a connection by recording the driver on the input pin.
    pub fn set_driver(&mut self, device: DeviceId, input: usize, driver: (DeviceId, OutputId)) {
        self.devices[device.0].inputs[input].driver = Some(driver);
    }

    pub fn signal_at(&self, device: DeviceId, output: OutputId) -> Signal {
        self.devices[device.0].outputs[output.0].signal
    }

    pub fn set_signal(&mut self, device: DeviceId, output: OutputId, signal: Signal) {
        self.devices[device.0].outputs[output.0].signal = signal;
    }

    /// The signal an input pin currently sees through its driver.
    pub fn input_signal(&self, pin: &InputPin) -> Signal {
        pin.driver
            .map(|(device, output)| self.signal_at(device, output))
            .unwrap_or(Signal::Undefined)
    }

    /// Flip a switch. The front-end API for driving a running simulation.
    pub fn set_switch(&mut self, name: &str, level: bool) -> Result<()> {
        let id = self
            .names
            .get(name)
            .and_then(|n| self.device_id(n))
            .ok_or_else(|| SimError::unknown_device(name))?;
        let device = &mut self.devices[id.0];
        if !matches!(device.kind, DeviceKind::Switch { .. }) {
            return Err(SimError::NotASwitch { name: name.into() });
        }
        device.outputs[0].signal = Signal::from_level(level);
        Ok(())
    }

    /// Human-readable label for an output pin ("dt1.Q", or "sw1" for a
    /// default output).
    pub fn point_label(&self, device: DeviceId, output: OutputId) -> String {
        let dev = &self.devices[device.0];
        match dev.outputs[output.0].name {
            Some(pin) => format!(
                "{}.{}",
                self.names.lookup(dev.name),
                self.names.lookup(pin)
            ),
            None => self.names.lookup(dev.name).to_string(),
        }
    }

    /// Human-readable label for an input pin ("g1.I2").
    pub fn input_label(&self, device: DeviceId, input: usize) -> String {
        let dev = &self.devices[device.0];
        format!(
            "{}.{}",
            self.names.lookup(dev.name),
            self.names.lookup(dev.inputs[input].name)
        )
    }

    /// Watch an output pin. Returns false if it is already monitored.
    pub fn add_monitor(&mut self, device: DeviceId, output: OutputId) -> bool {
        if self
            .monitors
            .iter()
            .any(|m| m.device == device && m.output == output)
        {
            return false;
        }
        let label = self.point_label(device, output);
        self.monitors.push(Monitor {
            device,
            output,
            label,
            trace: Vec::new(),
        });
        true
    }

    /// Watch a point given by name, for front-ends probing after the parse.
    pub fn add_monitor_by_name(&mut self, device: &str, pin: Option<&str>) -> Result<()> {
        let point = match pin {
            Some(pin) => format!("{device}.{pin}"),
            None => device.to_string(),
        };
        let id = self
            .names
            .get(device)
            .and_then(|n| self.device_id(n))
            .ok_or_else(|| SimError::unknown_point(&point))?;
        let pin_name = match pin {
            None => None,
            Some(pin) => Some(
                self.names
                    .get(pin)
                    .ok_or_else(|| SimError::unknown_point(&point))?,
            ),
        };
        let output = self
            .device(id)
            .output_index(pin_name)
            .ok_or_else(|| SimError::unknown_point(&point))?;
        if !self.add_monitor(id, output) {
            return Err(SimError::DuplicateMonitor { point });
        }
        Ok(())
    }

    /// Stop watching a point, discarding its trace.
    pub fn remove_monitor(&mut self, device: &str, pin: Option<&str>) -> Result<()> {
        let point = match pin {
            Some(pin) => format!("{device}.{pin}"),
            None => device.to_string(),
        };
        match self.monitors.iter().position(|m| m.label == point) {
            Some(index) => {
                self.monitors.remove(index);
                Ok(())
            }
            None => Err(SimError::NotMonitored { point }),
        }
    }

    /// Restore every device to power-on state and clear all traces.
    pub fn reset(&mut self) {
        for device in &mut self.devices {
            device.reset();
        }
        for monitor in &mut self.monitors {
            monitor.trace.clear();
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network_with(kind: DeviceKind) -> (Network, DeviceId) {
        let mut network = Network::new();
        let name = network.names.intern("dev");
        let id = network.add_device(name, kind);
        (network, id)
    }

    #[test]
    fn gate_pins_are_numbered() {
        let (network, id) = network_with(DeviceKind::And { inputs: 3 });
        let device = network.device(id);
        let labels: Vec<&str> = device
            .inputs
            .iter()
            .map(|p| network.names.lookup(p.name))
            .collect();
        assert_eq!(labels, ["I1", "I2", "I3"]);
        assert_eq!(device.outputs.len(), 1);
        assert_eq!(device.outputs[0].name, None);
        assert_eq!(device.outputs[0].signal, Signal::Low);
    }

    #[test]
    fn dtype_has_named_pins_and_no_default_output() {
        let (network, id) = network_with(DeviceKind::DType);
        let device = network.device(id);
        let q = network.names.get("Q").unwrap();
        let qbar = network.names.get("QBAR").unwrap();
        assert_eq!(device.output_index(Some(q)), Some(OutputId(0)));
        assert_eq!(device.output_index(Some(qbar)), Some(OutputId(1)));
        assert_eq!(device.output_index(None), None);
        assert_eq!(network.signal_at(id, OutputId(0)), Signal::Low);
        assert_eq!(network.signal_at(id, OutputId(1)), Signal::High);
        let clear = network.names.get("CLEAR").unwrap();
        assert_eq!(device.input_index(clear), Some(3));
    }

    #[test]
    fn switch_starts_at_its_configured_level() {
        let (network, id) = network_with(DeviceKind::Switch { initial: true });
        assert_eq!(network.signal_at(id, OutputId(0)), Signal::High);
    }

    #[test]
    fn set_switch_rejects_non_switches() {
        let (mut network, _) = network_with(DeviceKind::Xor);
        assert!(matches!(
            network.set_switch("dev", true),
            Err(SimError::NotASwitch { .. })
        ));
        assert!(matches!(
            network.set_switch("ghost", true),
            Err(SimError::UnknownDevice { .. })
        ));
    }

    #[test]
    fn drivers_are_recorded_on_the_input_pin() {
        let mut network = Network::new();
        let sw = network.names.intern("sw");
        let inv = network.names.intern("inv");
        let sw_id = network.add_device(sw, DeviceKind::Switch { initial: false });
        let inv_id = network.add_device(inv, DeviceKind::Not);
        assert_eq!(network.driver_of(inv_id, 0), None);
        network.set_driver(inv_id, 0, (sw_id, OutputId(0)));
        assert_eq!(network.driver_of(inv_id, 0), Some((sw_id, OutputId(0))));
        let pin = network.device(inv_id).inputs[0].clone();
        assert_eq!(network.input_signal(&pin), Signal::Low);
    }

    #[test]
    fn monitors_round_trip_by_name() {
        let (mut network, _) = network_with(DeviceKind::DType);
        network.add_monitor_by_name("dev", Some("Q")).unwrap();
        assert!(matches!(
            network.add_monitor_by_name("dev", Some("Q")),
            Err(SimError::DuplicateMonitor { .. })
        ));
        assert_eq!(network.monitors[0].label, "dev.Q");
        network.remove_monitor("dev", Some("Q")).unwrap();
        assert!(network.monitors.is_empty());
        assert!(matches!(
            network.remove_monitor("dev", Some("Q")),
            Err(SimError::NotMonitored { .. })
        ));
    }

    #[test]
    fn reset_restores_power_on_levels() {
        let (mut network, id) = network_with(DeviceKind::Switch { initial: false });
        network.set_switch("dev", true).unwrap();
        assert_eq!(network.signal_at(id, OutputId(0)), Signal::High);
        network.reset();
        assert_eq!(network.signal_at(id, OutputId(0)), Signal::Low);
    }
}

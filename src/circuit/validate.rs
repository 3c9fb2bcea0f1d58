//! Global network validation.
//!
//! Most semantic checks happen while the parser builds the network; the
//! checks here only make sense once the whole file has been read.

use super::Network;

/// Labels of input pins that have no driver, in device order.
///
/// A network with dangling inputs cannot be simulated: the affected gates
/// would read `Undefined` forever.
pub fn unconnected_inputs(network: &Network) -> Vec<String> {
    let mut dangling = Vec::new();
    for device in &network.devices {
        for (index, pin) in device.inputs.iter().enumerate() {
            if pin.driver.is_none() {
                dangling.push(network.input_label(device.id, index));
            }
        }
    }
    dangling
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{DeviceKind, OutputId};

    #[test]
    fn lists_every_dangling_input() {
        let mut network = Network::new();
        let sw = network.names.intern("sw");
        let g1 = network.names.intern("g1");
        let sw_id = network.add_device(sw, DeviceKind::Switch { initial: false });
        let g1_id = network.add_device(g1, DeviceKind::And { inputs: 2 });

        assert_eq!(unconnected_inputs(&network), ["g1.I1", "g1.I2"]);

        network.set_driver(g1_id, 0, (sw_id, OutputId(0)));
        assert_eq!(unconnected_inputs(&network), ["g1.I2"]);

        network.set_driver(g1_id, 1, (sw_id, OutputId(0)));
        assert!(unconnected_inputs(&network).is_empty());
    }

    #[test]
    fn sources_have_nothing_to_connect() {
        let mut network = Network::new();
        let cl = network.names.intern("cl");
        network.add_device(cl, DeviceKind::Clock { half_period: 2 });
        assert!(unconnected_inputs(&network).is_empty());
    }
}

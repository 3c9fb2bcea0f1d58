//! Core types for the network representation.

use std::fmt;

/// A unique identifier for a device in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub usize);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.0)
    }
}

/// Index of an output pin within its owning device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputId(pub usize);

/// A logic level on a connection.
///
/// `Rising` and `Falling` are transient values that live for a single step:
/// clocks emit them at a toggle and the D-type flip-flop uses them to detect
/// edges. They are demoted to their steady level before monitors sample.
/// `Undefined` is what an undriven input pin reads, and what a gate yields
/// when its defined inputs cannot decide the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Low,
    High,
    Rising,
    Falling,
    Undefined,
}

impl Signal {
    /// The boolean level this signal reads as, if defined.
    /// Transients count at the level they are moving to.
    pub fn level(self) -> Option<bool> {
        match self {
            Signal::High | Signal::Rising => Some(true),
            Signal::Low | Signal::Falling => Some(false),
            Signal::Undefined => None,
        }
    }

    /// The steady signal for a boolean level.
    pub fn from_level(level: bool) -> Self {
        if level {
            Signal::High
        } else {
            Signal::Low
        }
    }

    /// Collapse a one-step transient to its steady level.
    pub fn settled(self) -> Self {
        match self {
            Signal::Rising => Signal::High,
            Signal::Falling => Signal::Low,
            other => other,
        }
    }

    /// Single-character waveform glyph used when printing traces.
    pub fn glyph(self) -> char {
        match self {
            Signal::High => '-',
            Signal::Low => '_',
            Signal::Rising => '/',
            Signal::Falling => '\\',
            Signal::Undefined => '?',
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Signal::Low => "0",
            Signal::High => "1",
            Signal::Rising => "rising",
            Signal::Falling => "falling",
            Signal::Undefined => "?",
        };
        write!(f, "{text}")
    }
}

/// What a device is, with its static configuration.
///
/// Evaluation dispatches on this variant; there is no device class
/// hierarchy anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Manually operated level source with a configured initial state.
    Switch { initial: bool },
    /// Free-running clock; holds each level for `half_period` steps.
    Clock { half_period: u32 },
    And { inputs: u32 },
    Nand { inputs: u32 },
    Or { inputs: u32 },
    Nor { inputs: u32 },
    /// Exclusive-or, fixed at two inputs.
    Xor,
    /// Inverter, fixed at one input.
    Not,
    /// D-type flip-flop with DATA/CLK/SET/CLEAR inputs and Q/QBAR outputs.
    DType,
}

impl DeviceKind {
    /// Number of input pins a device of this kind carries.
    pub fn input_count(&self) -> usize {
        match self {
            DeviceKind::Switch { .. } | DeviceKind::Clock { .. } => 0,
            DeviceKind::And { inputs }
            | DeviceKind::Nand { inputs }
            | DeviceKind::Or { inputs }
            | DeviceKind::Nor { inputs } => *inputs as usize,
            DeviceKind::Xor => 2,
            DeviceKind::Not => 1,
            DeviceKind::DType => 4,
        }
    }

    /// Whether the device is re-evaluated during signal propagation.
    /// Sources hold their level for the step and the D-type latches
    /// separately, once per step.
    pub fn is_combinational(&self) -> bool {
        matches!(
            self,
            DeviceKind::And { .. }
                | DeviceKind::Nand { .. }
                | DeviceKind::Or { .. }
                | DeviceKind::Nor { .. }
                | DeviceKind::Xor
                | DeviceKind::Not
        )
    }

    /// The keyword this kind is written as in a definition file.
    pub fn describe(&self) -> &'static str {
        match self {
            DeviceKind::Switch { .. } => "SWITCH",
            DeviceKind::Clock { .. } => "CLOCK",
            DeviceKind::And { .. } => "AND",
            DeviceKind::Nand { .. } => "NAND",
            DeviceKind::Or { .. } => "OR",
            DeviceKind::Nor { .. } => "NOR",
            DeviceKind::Xor => "XOR",
            DeviceKind::Not => "NOT",
            DeviceKind::DType => "DTYPE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transients_read_at_their_target_level() {
        assert_eq!(Signal::Rising.level(), Some(true));
        assert_eq!(Signal::Falling.level(), Some(false));
        assert_eq!(Signal::Undefined.level(), None);
        assert_eq!(Signal::Rising.settled(), Signal::High);
        assert_eq!(Signal::Falling.settled(), Signal::Low);
        assert_eq!(Signal::High.settled(), Signal::High);
    }

    #[test]
    fn input_counts_match_device_shape() {
        assert_eq!(DeviceKind::Switch { initial: true }.input_count(), 0);
        assert_eq!(DeviceKind::Clock { half_period: 3 }.input_count(), 0);
        assert_eq!(DeviceKind::Nand { inputs: 5 }.input_count(), 5);
        assert_eq!(DeviceKind::Xor.input_count(), 2);
        assert_eq!(DeviceKind::Not.input_count(), 1);
        assert_eq!(DeviceKind::DType.input_count(), 4);
    }
}

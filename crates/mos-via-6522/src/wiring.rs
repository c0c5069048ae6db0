//! Board-side view of the two I/O ports.
//!
//! The register logic is the same in every 6522; what differs between
//! boards is what sits on the port pins. A [`PortWiring`] supplies the
//! external pin levels and hears about port changes. Wiring objects are
//! usually short-lived borrows of the real peripherals, built for one
//! register access.

/// Capabilities a board provides to a VIA's ports.
pub trait PortWiring {
    /// Levels driven onto port A input pins.
    fn port_a_external(&self) -> u8 {
        0xFF
    }

    /// Levels driven onto port B input pins.
    fn port_b_external(&self) -> u8 {
        0xFF
    }

    /// The computed port B value moved from `old` to `new`.
    fn port_b_changed(&mut self, _old: u8, _new: u8) {}

    /// The CPU wrote ORB or DDRB.
    fn port_b_written(&mut self, _orb: u8, _ddrb: u8) {}
}

/// Nothing attached: inputs float high and changes go nowhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unwired;

impl PortWiring for Unwired {}

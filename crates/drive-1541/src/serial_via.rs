//! VIA1 ($1800): the drive's serial bus interface.
//!
//! Port B carries the IEC lines (see [`crate::iec`]). CA1 sees the ATN
//! line through an inverter, and an ATN assertion also pulls the drive
//! CPU's IRQ under its own tag until the firmware reads port A.

use emu_core::{
    IrqLine, IrqSource, Observable, Snapshot, StateError, StateReader, StateWriter, Value,
};
use mos_via_6522::{PortWiring, Via6522};

use crate::iec::SerialBus;

/// Device address 8: both address jumpers read 0.
const DEVICE_ADDRESS_MASK: u8 = 0x9F;

/// Port B input levels for the current bus state.
fn port_b_lines(bus: &impl SerialBus) -> u8 {
    let external = (if bus.atn_line() { 0x00 } else { 0x80 })
        | (if bus.clock_line() { 0x00 } else { 0x04 })
        | (if bus.data_line() { 0x00 } else { 0x01 });
    external & DEVICE_ADDRESS_MASK
}

/// Wiring for CPU accesses: reads the lines, pushes pin updates.
struct SerialPins<'a, B: SerialBus> {
    bus: &'a mut B,
}

impl<B: SerialBus> PortWiring for SerialPins<'_, B> {
    fn port_b_external(&self) -> u8 {
        port_b_lines(&*self.bus)
    }

    fn port_b_written(&mut self, orb: u8, ddrb: u8) {
        self.bus.update_device_pins(orb, ddrb);
    }
}

/// Read-only wiring for side-effect-free register views.
struct SerialLines<'a, B: SerialBus> {
    bus: &'a B,
}

impl<B: SerialBus> PortWiring for SerialLines<'_, B> {
    fn port_b_external(&self) -> u8 {
        port_b_lines(self.bus)
    }
}

/// VIA1 of a 1541.
#[derive(Debug, Clone)]
pub struct SerialBusVia {
    via: Via6522,
    /// ATN level last fed to CA1.
    atn: bool,
}

impl SerialBusVia {
    #[must_use]
    pub fn new() -> Self {
        Self {
            via: Via6522::new(IrqSource::Via1),
            atn: true,
        }
    }

    pub fn reset(&mut self) {
        self.via.reset();
        self.atn = true;
    }

    /// Run one clock cycle.
    pub fn execute(&mut self, irq: &mut IrqLine) {
        self.via.execute(irq);
    }

    /// CPU read. Reading port A acknowledges a pending ATN interrupt.
    pub fn peek(&mut self, reg: u8, bus: &mut impl SerialBus, irq: &mut IrqLine) -> u8 {
        if matches!(reg & 0x0F, 0x01 | 0x0F) {
            irq.release(IrqSource::Atn);
        }
        self.via.peek(reg, &mut SerialPins { bus }, irq)
    }

    /// Side-effect-free register view.
    #[must_use]
    pub fn read(&self, reg: u8, bus: &impl SerialBus) -> u8 {
        self.via.read(reg, &SerialLines { bus })
    }

    /// CPU write. ORB and DDRB writes update the drive's bus pins.
    pub fn poke(&mut self, reg: u8, value: u8, bus: &mut impl SerialBus, irq: &mut IrqLine) {
        self.via.poke(reg, value, &mut SerialPins { bus }, irq);
    }

    /// Follow the ATN line after the bus changed.
    ///
    /// CA1 gets the inverted line. A falling ATN pulls the IRQ line under
    /// [`IrqSource::Atn`].
    pub fn sync_atn(&mut self, bus: &impl SerialBus, irq: &mut IrqLine) {
        let atn = bus.atn_line();
        if atn == self.atn {
            return;
        }
        self.atn = atn;
        self.via.set_ca1(!atn);
        if !atn {
            log::trace!("ATN asserted");
            irq.pull(IrqSource::Atn);
        }
    }

    #[must_use]
    pub fn via(&self) -> &Via6522 {
        &self.via
    }

    /// Direct access for control lines and input latches.
    pub fn via_mut(&mut self) -> &mut Via6522 {
        &mut self.via
    }
}

impl Default for SerialBusVia {
    fn default() -> Self {
        Self::new()
    }
}

impl Snapshot for SerialBusVia {
    fn state_size(&self) -> usize {
        self.via.state_size()
    }

    fn write_state(&self, w: &mut StateWriter) {
        self.via.write_state(w);
    }

    fn read_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        self.via.read_state(r)?;
        // CA1 holds the inverted ATN level
        self.atn = !self.via.ca1();
        Ok(())
    }
}

impl Observable for SerialBusVia {
    fn query(&self, path: &str) -> Option<Value> {
        self.via.query(path)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        self.via.query_paths()
    }
}

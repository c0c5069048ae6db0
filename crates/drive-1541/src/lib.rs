//! The two 6522 VIAs of a Commodore 1541 floppy drive.
//!
//! Both are plain [`Via6522`]s; what makes them different is what hangs off
//! port B:
//!
//!   VIA1 ($1800): IEC serial bus ([`SerialBusVia`], [`SerialBus`])
//!   VIA2 ($1C00): disk mechanics ([`MechanicsVia`], [`DriveMechanics`])
//!
//! Each register access borrows the peripheral it needs for the duration
//! of the call, so the drive board keeps ownership of the bus and the
//! mechanics. Both VIAs share the drive CPU's IRQ line under their own
//! tags, plus an ATN tag that VIA1 raises and clears.

mod iec;
mod mechanics_via;
mod serial_via;

pub use iec::{IecBus, SerialBus};
pub use mechanics_via::{DriveMechanics, MechanicsVia};
pub use mos_via_6522::Via6522;
pub use serial_via::SerialBusVia;

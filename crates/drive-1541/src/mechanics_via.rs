//! VIA2 ($1C00): the drive's disk controller.
//!
//! | Bit | Port B |
//! |-----|--------|
//! | 0-1 | Stepper motor phase |
//! | 2   | Spindle motor |
//! | 3   | Red LED |
//! | 4   | Write protect (0 = light barrier blocked) |
//! | 5-6 | Density zone |
//! | 7   | SYNC (0 = sync mark under the head) |
//!
//! Port A is the GCR byte from the read head. The firmware always runs
//! with port A input latching on; the byte is fed in through
//! [`Via6522::latch_input_a`].

use emu_core::{
    IrqLine, IrqSource, Observable, Snapshot, StateError, StateReader, StateWriter, Value,
};
use mos_via_6522::{PortWiring, Via6522};

/// The floppy mechanics as VIA2 sees them.
pub trait DriveMechanics {
    /// True while a SYNC mark is under the head.
    fn sync(&self) -> bool;

    /// True while the write-protect light barrier is blocked.
    fn light_barrier(&self) -> bool;

    /// Select density zone 0-3.
    fn set_zone(&mut self, zone: u8);

    fn set_red_led(&mut self, on: bool);

    fn set_rotating(&mut self, on: bool);

    /// Step the head one half track inwards.
    fn move_head_up(&mut self);

    /// Step the head one half track outwards.
    fn move_head_down(&mut self);
}

fn port_b_sensors(mech: &impl DriveMechanics) -> u8 {
    (if mech.sync() { 0x00 } else { 0x80 })
        | (if mech.light_barrier() { 0x00 } else { 0x10 })
        | 0x6F
}

/// Wiring for CPU accesses: reads the sensors, decodes port B changes.
struct MechanicsPins<'a, M: DriveMechanics> {
    mech: &'a mut M,
}

impl<M: DriveMechanics> PortWiring for MechanicsPins<'_, M> {
    fn port_b_external(&self) -> u8 {
        port_b_sensors(&*self.mech)
    }

    fn port_b_changed(&mut self, old: u8, new: u8) {
        if (new ^ old) & 0x60 != 0 {
            self.mech.set_zone((new >> 5) & 0x03);
        }
        if (new ^ old) & 0x08 != 0 {
            self.mech.set_red_led(new & 0x08 != 0);
        }
        if (new ^ old) & 0x04 != 0 {
            self.mech.set_rotating(new & 0x04 != 0);
        }

        // Phases run 00-01-10-11 moving in, the reverse moving out
        let phase = new & 0x03;
        if phase != old & 0x03 {
            if phase == old.wrapping_add(1) & 0x03 {
                self.mech.move_head_up();
            } else if phase == old.wrapping_sub(1) & 0x03 {
                self.mech.move_head_down();
            } else {
                log::warn!(
                    "Unexpected stepper motor control sequence ({:02b} -> {phase:02b})",
                    old & 0x03
                );
            }
        }
    }
}

/// Read-only wiring for side-effect-free register views.
struct MechanicsSensors<'a, M: DriveMechanics> {
    mech: &'a M,
}

impl<M: DriveMechanics> PortWiring for MechanicsSensors<'_, M> {
    fn port_b_external(&self) -> u8 {
        port_b_sensors(self.mech)
    }
}

/// VIA2 of a 1541.
#[derive(Debug, Clone)]
pub struct MechanicsVia {
    via: Via6522,
}

impl MechanicsVia {
    #[must_use]
    pub fn new() -> Self {
        Self {
            via: Via6522::new(IrqSource::Via2),
        }
    }

    pub fn reset(&mut self) {
        self.via.reset();
    }

    /// Run one clock cycle.
    pub fn execute(&mut self, irq: &mut IrqLine) {
        self.via.execute(irq);
    }

    /// CPU read. Port A returns the latched GCR byte, or 0 with latching
    /// disabled.
    pub fn peek(&mut self, reg: u8, mech: &mut impl DriveMechanics, irq: &mut IrqLine) -> u8 {
        let value = self.via.peek(reg, &mut MechanicsPins { mech }, irq);
        match reg & 0x0F {
            0x01 | 0x0F => self.latched_port_a(),
            _ => value,
        }
    }

    /// Side-effect-free register view.
    #[must_use]
    pub fn read(&self, reg: u8, mech: &impl DriveMechanics) -> u8 {
        match reg & 0x0F {
            0x01 | 0x0F => self.latched_port_a(),
            _ => self.via.read(reg, &MechanicsSensors { mech }),
        }
    }

    /// CPU write. Port B changes reach the mechanics.
    pub fn poke(&mut self, reg: u8, value: u8, mech: &mut impl DriveMechanics, irq: &mut IrqLine) {
        match reg & 0x0F {
            0x03 if value != 0x00 && value != 0xFF => {
                log::debug!("Data direction bits of VIA2 contain suspicious values (${value:02X})");
            }
            0x0C => {
                let pcr = self.via.pcr();
                if pcr & 0x20 == 0 && value & 0x20 != 0 {
                    log::debug!("Switching to read mode");
                }
                if pcr & 0x20 != 0 && value & 0x20 == 0 {
                    log::debug!("Switching to write mode");
                }
            }
            _ => {}
        }
        self.via.poke(reg, value, &mut MechanicsPins { mech }, irq);
    }

    /// Outputs from ORA, inputs from the latch.
    fn latched_port_a(&self) -> u8 {
        if self.via.input_latching_a() {
            let ddra = self.via.ddra();
            (ddra & self.via.ora()) | (!ddra & self.via.ira())
        } else {
            log::warn!("Input latching of VIA2 is disabled");
            0
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

impl Default for MechanicsVia {
    fn default() -> Self {
        Self::new()
    }
}

impl Snapshot for MechanicsVia {
    fn state_size(&self) -> usize {
        self.via.state_size()
    }

    fn write_state(&self, w: &mut StateWriter) {
        self.via.write_state(w);
    }

    fn read_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        self.via.read_state(r)
    }
}

impl Observable for MechanicsVia {
    fn query(&self, path: &str) -> Option<Value> {
        self.via.query(path)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        self.via.query_paths()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Call {
        Zone(u8),
        Led(bool),
        Rotating(bool),
        Up,
        Down,
    }

    #[derive(Default)]
    struct Floppy {
        sync: bool,
        barrier: bool,
        calls: Vec<Call>,
    }

    impl DriveMechanics for Floppy {
        fn sync(&self) -> bool {
            self.sync
        }
        fn light_barrier(&self) -> bool {
            self.barrier
        }
        fn set_zone(&mut self, zone: u8) {
            self.calls.push(Call::Zone(zone));
        }
        fn set_red_led(&mut self, on: bool) {
            self.calls.push(Call::Led(on));
        }
        fn set_rotating(&mut self, on: bool) {
            self.calls.push(Call::Rotating(on));
        }
        fn move_head_up(&mut self) {
            self.calls.push(Call::Up);
        }
        fn move_head_down(&mut self) {
            self.calls.push(Call::Down);
        }
    }

    /// VIA2 set up the way the drive firmware does: bits 0-3 and 5-6 out.
    fn configured() -> (MechanicsVia, Floppy, IrqLine) {
        let mut via = MechanicsVia::new();
        let mut floppy = Floppy::default();
        let mut irq = IrqLine::new();
        via.poke(0x02, 0x6F, &mut floppy, &mut irq);
        floppy.calls.clear();
        (via, floppy, irq)
    }

    #[test]
    fn stepper_sequences() {
        let cases = [
            (0b01, vec![Call::Up]),
            (0b11, vec![Call::Down]),
            (0b10, vec![]),
        ];
        for (phase, expected) in cases {
            let (mut via, mut floppy, mut irq) = configured();
            via.poke(0x00, phase, &mut floppy, &mut irq);
            assert_eq!(floppy.calls, expected, "00 -> {phase:02b}");
        }
    }

    #[test]
    fn stepper_wraps_around() {
        let (mut via, mut floppy, mut irq) = configured();
        for orb in [0b01, 0b10, 0b11, 0b00] {
            via.poke(0x00, orb, &mut floppy, &mut irq);
        }
        via.poke(0x00, 0b11, &mut floppy, &mut irq);
        assert_eq!(
            floppy.calls,
            vec![Call::Up, Call::Up, Call::Up, Call::Up, Call::Down]
        );
    }

    #[test]
    fn motor_led_and_zone_follow_port_b() {
        let (mut via, mut floppy, mut irq) = configured();
        via.poke(0x00, 0x6C, &mut floppy, &mut irq);
        assert_eq!(
            floppy.calls,
            vec![Call::Zone(3), Call::Led(true), Call::Rotating(true)]
        );

        floppy.calls.clear();
        via.poke(0x00, 0x24, &mut floppy, &mut irq);
        assert_eq!(floppy.calls, vec![Call::Zone(1), Call::Led(false)]);

        // Same value again: nothing changed
        floppy.calls.clear();
        via.poke(0x00, 0x24, &mut floppy, &mut irq);
        assert!(floppy.calls.is_empty());
    }

    #[test]
    fn sensors_on_port_b() {
        let (mut via, mut floppy, mut irq) = configured();
        assert_eq!(via.peek(0x00, &mut floppy, &mut irq) & 0x90, 0x90);

        floppy.sync = true;
        floppy.barrier = true;
        assert_eq!(via.peek(0x00, &mut floppy, &mut irq) & 0x90, 0x00);
        assert_eq!(via.read(0x00, &floppy) & 0x90, 0x00);
    }

    #[test]
    fn port_a_reads_latched_byte() {
        let (mut via, mut floppy, mut irq) = configured();
        // ACR bit 0: latch port A
        via.poke(0x0B, 0x01, &mut floppy, &mut irq);
        via.via_mut().latch_input_a(0x52);
        assert_eq!(via.peek(0x01, &mut floppy, &mut irq), 0x52);
        assert_eq!(via.read(0x0F, &floppy), 0x52);

        // Output bits come from ORA
        via.poke(0x03, 0x0F, &mut floppy, &mut irq);
        via.poke(0x01, 0x0A, &mut floppy, &mut irq);
        assert_eq!(via.peek(0x0F, &mut floppy, &mut irq), 0x5A);
    }

    #[test]
    fn port_a_without_latching_reads_zero() {
        let (mut via, mut floppy, mut irq) = configured();
        via.via_mut().latch_input_a(0x52);
        assert_eq!(via.peek(0x01, &mut floppy, &mut irq), 0x00);
        assert_eq!(via.read(0x01, &floppy), 0x00);
    }

    #[test]
    fn port_a_read_still_clears_ca1() {
        let (mut via, mut floppy, mut irq) = configured();
        via.via_mut().set_ca1(true);
        via.via_mut().set_ca1(false); // Negative edge: byte ready
        assert_eq!(via.via().ifr() & 0x02, 0x02);
        let _ = via.peek(0x01, &mut floppy, &mut irq);
        assert_eq!(via.via().ifr() & 0x02, 0x00);
    }

    #[test]
    fn pcr_write_sets_cb2_mode_line() {
        let (mut via, mut floppy, mut irq) = configured();
        via.poke(0x0C, 0xEE, &mut floppy, &mut irq);
        assert!(via.via().cb2_out());
        via.poke(0x0C, 0xCE, &mut floppy, &mut irq);
        assert!(!via.via().cb2_out());
    }
}

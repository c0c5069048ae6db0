//! Register access from the CPU (`peek`/`poke`) and from tooling (`read`).

use emu_core::IrqLine;

use crate::control::ControlLineMode;
use crate::pipeline::{
    CLEAR_CA2_OUT1, CLEAR_CB2_OUT1, COUNT_B0, POST_ONE_SHOT_A0, POST_ONE_SHOT_B0,
    SET_CA2_OUT0, SET_CB2_OUT0,
};
use crate::{
    IFR_CA1, IFR_CA2, IFR_CB1, IFR_CB2, IFR_SR, IFR_T1, IFR_T2, PortWiring, Via6522,
};

impl Via6522 {
    /// CPU read of register `reg` (masked to 4 bits).
    ///
    /// Reads have side effects: port reads clear control line flags and may
    /// start a CA2 handshake, counter-low reads clear timer flags.
    pub fn peek(&mut self, reg: u8, wiring: &mut impl PortWiring, irq: &mut IrqLine) -> u8 {
        match reg & 0x0F {
            0x00 => {
                // CB2 handshake and pulse modes only react to writes
                let mode = self.cb2_mode();
                let mut mask = IFR_CB1;
                if mode.is_input() && mode.clears_flag_on_access() {
                    mask |= IFR_CB2;
                }
                self.clear_flags(mask, irq);
                self.update_pb(wiring);
                self.pb
            }
            0x01 => {
                self.access_port_a(true, irq);
                self.update_pa(wiring);
                self.pa
            }
            0x02 => self.ddrb,
            0x03 => self.ddra,
            0x04 => {
                self.clear_flags(IFR_T1, irq);
                self.t1 as u8
            }
            0x05 => (self.t1 >> 8) as u8,
            0x06 => self.t1_latch_lo,
            0x07 => self.t1_latch_hi,
            0x08 => {
                self.clear_flags(IFR_T2, irq);
                self.t2 as u8
            }
            0x09 => (self.t2 >> 8) as u8,
            0x0A => {
                self.clear_flags(IFR_SR, irq);
                self.sr
            }
            0x0B => self.acr,
            0x0C => self.pcr,
            0x0D => self.ifr_with_any(),
            0x0E => self.ier | 0x80,
            _ => {
                // ORA without handshake
                self.access_port_a(false, irq);
                self.update_pa(wiring);
                self.pa
            }
        }
    }

    /// Side-effect-free view of register `reg`, for debuggers.
    #[must_use]
    pub fn read(&self, reg: u8, wiring: &impl PortWiring) -> u8 {
        match reg & 0x0F {
            0x00 => self.port_b_value(wiring),
            0x01 | 0x0F => self.port_a_value(wiring),
            0x02 => self.ddrb,
            0x03 => self.ddra,
            0x04 => self.t1 as u8,
            0x05 => (self.t1 >> 8) as u8,
            0x06 => self.t1_latch_lo,
            0x07 => self.t1_latch_hi,
            0x08 => self.t2 as u8,
            0x09 => (self.t2 >> 8) as u8,
            0x0A => self.sr,
            0x0B => self.acr,
            0x0C => self.pcr,
            0x0D => self.ifr_with_any(),
            _ => self.ier | 0x80,
        }
    }

    /// CPU write of `value` to register `reg` (masked to 4 bits).
    pub fn poke(&mut self, reg: u8, value: u8, wiring: &mut impl PortWiring, irq: &mut IrqLine) {
        match reg & 0x0F {
            0x00 => {
                let mode = self.cb2_mode();
                let mut mask = IFR_CB1;
                if mode.clears_flag_on_access() {
                    mask |= IFR_CB2;
                }
                match mode {
                    ControlLineMode::Handshake => self.pipeline.schedule(CLEAR_CB2_OUT1),
                    ControlLineMode::Pulse => {
                        self.pipeline.schedule(CLEAR_CB2_OUT1 | SET_CB2_OUT0);
                    }
                    _ => {}
                }
                self.clear_flags(mask, irq);
                self.orb = value;
                self.update_pb(wiring);
                wiring.port_b_written(self.orb, self.ddrb);
            }
            0x01 => {
                self.access_port_a(true, irq);
                self.ora = value;
                self.update_pa(wiring);
            }
            0x02 => {
                self.ddrb = value;
                self.update_pb(wiring);
                wiring.port_b_written(self.orb, self.ddrb);
            }
            0x03 => {
                self.ddra = value;
                self.update_pa(wiring);
            }
            0x04 | 0x06 => self.t1_latch_lo = value,
            0x05 => {
                // Latch to counter; counting carries on from the new value
                self.t1_latch_hi = value;
                self.t1 = self.t1_latch();
                self.pipeline.release(POST_ONE_SHOT_A0);
                self.pb7toggle = false;
                if self.acr & 0x80 != 0 {
                    self.pb7_timer_out = false;
                }
                self.clear_flags(IFR_T1, irq);
            }
            0x07 => self.t1_latch_hi = value,
            0x08 => {
                self.t2_latch_lo = value;
                self.clear_flags(IFR_T2, irq);
            }
            0x09 => {
                self.t2 = u16::from_le_bytes([self.t2_latch_lo, value]);
                self.pipeline.release(POST_ONE_SHOT_B0);
                self.clear_flags(IFR_T2, irq);
            }
            0x0A => {
                self.sr = value;
                self.clear_flags(IFR_SR, irq);
            }
            0x0B => self.write_acr(value),
            0x0C => self.write_pcr(value),
            0x0D => {
                // Writing 1s clears the corresponding flags
                self.clear_flags(value & 0x7F, irq);
            }
            0x0E => {
                // Bit 7 selects set (1) or clear (0)
                if value & 0x80 != 0 {
                    self.ier |= value & 0x7F;
                } else {
                    self.ier &= !value;
                }
                self.ier &= 0x7F;
                self.update_irq(irq);
            }
            _ => {
                self.access_port_a(false, irq);
                self.ora = value;
                self.update_pa(wiring);
            }
        }
    }

    /// CA1/CA2 side effects shared by ORA reads and writes.
    fn access_port_a(&mut self, handshake: bool, irq: &mut IrqLine) {
        let mode = self.ca2_mode();
        let mut mask = IFR_CA1;
        if mode.clears_flag_on_access() {
            mask |= IFR_CA2;
        }
        if handshake {
            match mode {
                ControlLineMode::Handshake => self.pipeline.schedule(CLEAR_CA2_OUT1),
                ControlLineMode::Pulse => {
                    self.pipeline.schedule(CLEAR_CA2_OUT1 | SET_CA2_OUT0);
                }
                _ => {}
            }
        }
        self.clear_flags(mask, irq);
    }

    fn write_acr(&mut self, value: u8) {
        self.acr = value;
        if self.pulse_counting_mode() {
            // T2 now counts PB6 pulses instead of cycles
            self.pipeline.cancel(COUNT_B0);
            self.pipeline.release(COUNT_B0);
        } else {
            self.pipeline.schedule(COUNT_B0);
            self.pipeline.hold(COUNT_B0);
        }
        if self.acr & 0x80 != 0 {
            self.pb7_timer_out = self.pb7toggle;
        }
    }

    fn write_pcr(&mut self, value: u8) {
        self.pcr = value;
        match self.ca2_mode() {
            ControlLineMode::ManualLow => self.ca2_out = false,
            ControlLineMode::ManualHigh => self.ca2_out = true,
            _ => {}
        }
        match self.cb2_mode() {
            ControlLineMode::ManualLow => self.cb2_out = false,
            ControlLineMode::ManualHigh => self.cb2_out = true,
            _ => {}
        }
    }

    /// IFR as the CPU sees it: bit 7 set while any enabled flag is.
    fn ifr_with_any(&self) -> u8 {
        self.ifr | if self.irq_pending() { 0x80 } else { 0 }
    }
}

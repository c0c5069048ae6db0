//! MOS 6522 Versatile Interface Adapter (VIA).
//!
//! The 6522 provides two 8-bit I/O ports, two 16-bit timers, a serial
//! shift register, and an interrupt controller. The 1541 floppy drive
//! uses two VIAs: VIA1 for the IEC serial bus interface and VIA2 for
//! the disk controller. This crate holds the logic both share; what sits
//! on the port pins is supplied per access through [`PortWiring`].
//!
//! # Registers ($0-$F)
//!
//! | Reg | Name | Description                         |
//! |-----|------|-------------------------------------|
//! | $0  | ORB  | Port B data (CB1/CB2 side effects)  |
//! | $1  | ORA  | Port A data (CA1/CA2 side effects)  |
//! | $2  | DDRB | Port B data direction (1 = output)  |
//! | $3  | DDRA | Port A data direction (1 = output)  |
//! | $4  | T1CL | Timer 1 counter low (read clears T1 IRQ) |
//! | $5  | T1CH | Timer 1 counter high (write starts T1) |
//! | $6  | T1LL | Timer 1 latch low                   |
//! | $7  | T1LH | Timer 1 latch high                  |
//! | $8  | T2CL | Timer 2 counter low (read clears T2 IRQ) |
//! | $9  | T2CH | Timer 2 counter high (write starts T2) |
//! | $A  | SR   | Shift register                      |
//! | $B  | ACR  | Auxiliary control register           |
//! | $C  | PCR  | Peripheral control register          |
//! | $D  | IFR  | Interrupt flag register              |
//! | $E  | IER  | Interrupt enable register            |
//! | $F  | ORA  | Port A data (no handshake)           |
//!
//! # Timing
//!
//! Every effect that real silicon delivers a cycle late travels through a
//! small bit pipeline (see `pipeline.rs`): an enabled interrupt flag
//! reaches the IRQ line one [`Via6522::execute`] later, CA2/CB2 pulses
//! land a cycle after the access that caused them, and the free-run
//! reload of timer 1 takes three stages.

#![allow(clippy::cast_possible_truncation)]

mod access;
mod control;
mod pipeline;
mod snapshot;
mod timers;
mod wiring;

pub use control::ControlLineMode;
pub use snapshot::STATE_SIZE;
pub use wiring::{PortWiring, Unwired};

use emu_core::{IrqLine, IrqSource};
use pipeline::{
    COUNT_A0, COUNT_A1, COUNT_B0, COUNT_B1, INTERRUPT0, INTERRUPT1, Pipeline,
};

/// Power-on value of both timer counters and the T1 latch.
pub const TIMER_RESET_VALUE: u16 = 0x01AA;

/// MOS 6522 Versatile Interface Adapter.
#[derive(Debug, Clone)]
pub struct Via6522 {
    /// Tag this chip uses on the shared IRQ line.
    source: IrqSource,

    /// Last computed port A pin levels.
    pa: u8,
    /// CA1 input level.
    ca1: bool,
    /// CA2 input level.
    ca2: bool,
    /// CA2 output level.
    ca2_out: bool,
    /// Last computed port B pin levels.
    pb: u8,
    /// CB1 input level.
    cb1: bool,
    /// CB2 input level.
    cb2: bool,
    /// CB2 output level.
    cb2_out: bool,

    /// Port A data direction register (1 = output).
    ddra: u8,
    /// Port B data direction register (1 = output).
    ddrb: u8,
    /// Port A output register.
    ora: u8,
    /// Port B output register.
    orb: u8,
    /// Port A input latch.
    ira: u8,
    /// Port B input latch.
    irb: u8,

    /// Timer 1 counter (counts down).
    t1: u16,
    /// Timer 2 counter (counts down).
    t2: u16,
    t1_latch_lo: u8,
    t1_latch_hi: u8,
    /// Timer 2 only latches its low byte.
    t2_latch_lo: u8,

    /// Toggled each time timer 1 fires.
    pb7toggle: bool,
    /// Timer 1 level driven onto PB7 while ACR bit 7 is set.
    pb7_timer_out: bool,

    /// Peripheral control register (PCR).
    pcr: u8,
    /// Auxiliary control register (ACR).
    /// Bit 7: T1 drives PB7
    /// Bit 6: T1 free-run (0 = one-shot)
    /// Bit 5: T2 counts PB6 pulses (0 = timed)
    /// Bits 4-2: Shift register control
    /// Bit 1: PB latching enable
    /// Bit 0: PA latching enable
    acr: u8,
    /// Interrupt enable register. Bit 7 is never stored.
    ier: u8,
    /// Interrupt flag register. Bit 7 is never stored.
    /// Bit 6: Timer 1
    /// Bit 5: Timer 2
    /// Bit 4: CB1
    /// Bit 3: CB2
    /// Bit 2: Shift register
    /// Bit 1: CA1
    /// Bit 0: CA2
    ifr: u8,
    /// Shift register.
    sr: u8,

    /// One-cycle delayed effects.
    pipeline: Pipeline,
}

impl Via6522 {
    /// Create a VIA in its power-on state, pulling `source` on the IRQ line.
    #[must_use]
    pub fn new(source: IrqSource) -> Self {
        let mut via = Self::cleared(source);
        via.apply_power_on_defaults();
        via
    }

    /// Every state item zeroed.
    fn cleared(source: IrqSource) -> Self {
        Self {
            source,
            pa: 0,
            ca1: false,
            ca2: false,
            ca2_out: false,
            pb: 0,
            cb1: false,
            cb2: false,
            cb2_out: false,
            ddra: 0,
            ddrb: 0,
            ora: 0,
            orb: 0,
            ira: 0,
            irb: 0,
            t1: 0,
            t2: 0,
            t1_latch_lo: 0,
            t1_latch_hi: 0,
            t2_latch_lo: 0,
            pb7toggle: false,
            pb7_timer_out: false,
            pcr: 0,
            acr: 0,
            ier: 0,
            ifr: 0,
            sr: 0,
            pipeline: Pipeline::new(),
        }
    }

    fn apply_power_on_defaults(&mut self) {
        self.t1 = TIMER_RESET_VALUE;
        self.t2 = TIMER_RESET_VALUE;
        self.t1_latch_hi = (TIMER_RESET_VALUE >> 8) as u8;
        self.t1_latch_lo = TIMER_RESET_VALUE as u8;
        self.t2_latch_lo = TIMER_RESET_VALUE as u8;
        // Both timers count from the first cycle
        self.pipeline.hold(COUNT_A0 | COUNT_B0);
        self.pipeline.schedule(COUNT_A0 | COUNT_A1 | COUNT_B0 | COUNT_B1);
    }

    /// Clear every state item, then load the power-on defaults.
    ///
    /// The IRQ line is not touched; the board releases it on reset.
    pub fn reset(&mut self) {
        *self = Self::cleared(self.source);
        self.apply_power_on_defaults();
        log::debug!("{:?} reset", self.source);
    }

    /// Re-evaluate the IRQ output after IFR or IER changed.
    ///
    /// Pulls the line for this chip's tag while an enabled flag is set and
    /// releases it otherwise, dropping any interrupt still in flight.
    fn update_irq(&mut self, irq: &mut IrqLine) {
        if self.irq_pending() {
            irq.pull(self.source);
        } else {
            irq.release(self.source);
            self.pipeline.cancel(INTERRUPT0 | INTERRUPT1);
        }
    }

    /// Clear IFR bits and re-evaluate the IRQ output.
    fn clear_flags(&mut self, mask: u8, irq: &mut IrqLine) {
        self.ifr &= !mask;
        self.update_irq(irq);
    }

    /// Recompute port A pin levels from ORA, DDRA and the external lines.
    fn update_pa(&mut self, wiring: &impl PortWiring) {
        self.pa = self.port_a_value(wiring);
    }

    /// Recompute port B pin levels and report a change to the wiring.
    fn update_pb(&mut self, wiring: &mut impl PortWiring) {
        let old = self.pb;
        self.pb = self.port_b_value(wiring);
        if self.pb != old {
            wiring.port_b_changed(old, self.pb);
        }
    }

    fn port_a_value(&self, wiring: &impl PortWiring) -> u8 {
        (self.ora & self.ddra) | (wiring.port_a_external() & !self.ddra)
    }

    fn port_b_value(&self, wiring: &impl PortWiring) -> u8 {
        let mut value = (self.orb & self.ddrb) | (wiring.port_b_external() & !self.ddrb);
        if self.acr & 0x80 != 0 {
            // PB7 is driven by Timer 1
            value = (value & 0x7F) | if self.pb7_timer_out { 0x80 } else { 0 };
        }
        value
    }

    /// Feed the port A input latch.
    pub fn latch_input_a(&mut self, value: u8) {
        self.ira = value;
    }

    /// Feed the port B input latch.
    pub fn latch_input_b(&mut self, value: u8) {
        self.irb = value;
    }

    /// True while an enabled interrupt flag is set.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.ifr & self.ier != 0
    }

    #[must_use]
    pub fn source(&self) -> IrqSource {
        self.source
    }

    /// ACR bit 0.
    #[must_use]
    pub fn input_latching_a(&self) -> bool {
        self.acr & 0x01 != 0
    }

    /// ACR bit 1.
    #[must_use]
    pub fn input_latching_b(&self) -> bool {
        self.acr & 0x02 != 0
    }

    #[must_use]
    pub fn pa(&self) -> u8 {
        self.pa
    }

    #[must_use]
    pub fn pb(&self) -> u8 {
        self.pb
    }

    #[must_use]
    pub fn ora(&self) -> u8 {
        self.ora
    }

    #[must_use]
    pub fn orb(&self) -> u8 {
        self.orb
    }

    #[must_use]
    pub fn ddra(&self) -> u8 {
        self.ddra
    }

    #[must_use]
    pub fn ddrb(&self) -> u8 {
        self.ddrb
    }

    #[must_use]
    pub fn ira(&self) -> u8 {
        self.ira
    }

    #[must_use]
    pub fn irb(&self) -> u8 {
        self.irb
    }

    #[must_use]
    pub fn t1(&self) -> u16 {
        self.t1
    }

    #[must_use]
    pub fn t2(&self) -> u16 {
        self.t2
    }

    #[must_use]
    pub fn t1_latch(&self) -> u16 {
        u16::from_le_bytes([self.t1_latch_lo, self.t1_latch_hi])
    }

    #[must_use]
    pub fn t2_latch_lo(&self) -> u8 {
        self.t2_latch_lo
    }

    #[must_use]
    pub fn acr(&self) -> u8 {
        self.acr
    }

    #[must_use]
    pub fn pcr(&self) -> u8 {
        self.pcr
    }

    /// Stored flags, without the computed bit 7.
    #[must_use]
    pub fn ifr(&self) -> u8 {
        self.ifr
    }

    /// Stored enables, without the bit 7 that reads back as 1.
    #[must_use]
    pub fn ier(&self) -> u8 {
        self.ier
    }

    #[must_use]
    pub fn sr(&self) -> u8 {
        self.sr
    }

    /// Last level driven onto CA1.
    #[must_use]
    pub fn ca1(&self) -> bool {
        self.ca1
    }

    /// Last level driven onto CB1.
    #[must_use]
    pub fn cb1(&self) -> bool {
        self.cb1
    }

    #[must_use]
    pub fn ca2_out(&self) -> bool {
        self.ca2_out
    }

    #[must_use]
    pub fn cb2_out(&self) -> bool {
        self.cb2_out
    }

    #[must_use]
    pub fn pb7_toggle(&self) -> bool {
        self.pb7toggle
    }

    #[must_use]
    pub fn pb7_timer_out(&self) -> bool {
        self.pb7_timer_out
    }
}

// IFR/IER bit masks
const IFR_CA2: u8 = 0x01;
const IFR_CA1: u8 = 0x02;
const IFR_SR: u8 = 0x04;
const IFR_CB2: u8 = 0x08;
const IFR_CB1: u8 = 0x10;
const IFR_T2: u8 = 0x20;
const IFR_T1: u8 = 0x40;

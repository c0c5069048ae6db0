//! Per-cycle execution: timers, interrupt delivery, CA2/CB2 outputs.
//!
//! One-shot timing for timer 1 with latch N, counted from the T1C-H write:
//!
//! ```text
//! cycle    1    2   ...   N    N+1
//! T1      N-1  N-2  ...   0   FFFF
//! IFR6                    1
//! IRQ                          low   (if enabled)
//! ```
//!
//! A latch of 0 times out on the first cycle, as the counter wraps to
//! FFFF.
//!
//! In free-run mode the zero cycle also starts a three-stage reload, so
//! the counter shows FFFF for one cycle, is reloaded the next, and the
//! period is N+2 cycles.

use emu_core::IrqLine;

use crate::pipeline::{
    CLEAR_CA2_OUT1, CLEAR_CB2_OUT1, COUNT_A1, COUNT_B1, INTERRUPT0, INTERRUPT1,
    POST_ONE_SHOT_A0, POST_ONE_SHOT_B0, RELOAD_A0, RELOAD_A2, SET_CA2_OUT1, SET_CB2_OUT1,
};
use crate::{IFR_T1, IFR_T2, Via6522};

impl Via6522 {
    /// Run one clock cycle.
    pub fn execute(&mut self, irq: &mut IrqLine) {
        self.execute_timer1();
        self.execute_timer2();

        if self.irq_pending() {
            self.pipeline.schedule(INTERRUPT0);
        }
        if self.pipeline.is_active(INTERRUPT1) {
            irq.pull(self.source);
        }

        if self.pipeline.is_active(SET_CA2_OUT1) {
            self.ca2_out = true;
        }
        if self.pipeline.is_active(CLEAR_CA2_OUT1) {
            self.ca2_out = false;
        }
        if self.pipeline.is_active(SET_CB2_OUT1) {
            self.cb2_out = true;
        }
        if self.pipeline.is_active(CLEAR_CB2_OUT1) {
            self.cb2_out = false;
        }

        self.pipeline.advance();
    }

    /// True when ACR selects free-running timer 1.
    #[must_use]
    pub fn free_run_mode(&self) -> bool {
        self.acr & 0x40 != 0
    }

    /// True when ACR makes timer 2 count PB6 pulses.
    #[must_use]
    pub fn pulse_counting_mode(&self) -> bool {
        self.acr & 0x20 != 0
    }

    fn execute_timer1(&mut self) {
        let mut underflow = false;
        if self.pipeline.is_active(RELOAD_A2) {
            // Automatic reload is a latch-to-counter transfer: re-arm
            self.t1 = self.t1_latch();
            self.pipeline.release(POST_ONE_SHOT_A0);
        } else if self.pipeline.is_active(COUNT_A1) {
            underflow = self.t1 == 0;
            self.t1 = self.t1.wrapping_sub(1);
        }

        // A counter loaded with 0 is decremented before it is ever seen at
        // zero; the wrap to FFFF is its time-out
        if self.t1 != 0 && !underflow {
            return;
        }

        if !self.pipeline.is_held(POST_ONE_SHOT_A0) {
            self.ifr |= IFR_T1;
            self.pb7toggle = !self.pb7toggle;
            if self.free_run_mode() {
                self.pipeline.schedule(RELOAD_A0);
            }
            log::trace!("{:?} timer 1 fired", self.source);
        }
        self.pipeline.hold(POST_ONE_SHOT_A0);

        // With ACR7 set, PB7 went low on the T1C-H write and returns high here
        if self.acr & 0x80 != 0 {
            self.pb7_timer_out = self.pb7toggle;
        }
    }

    fn execute_timer2(&mut self) {
        if self.pipeline.is_active(COUNT_B1) {
            self.t2 = self.t2.wrapping_sub(1);
        }

        if self.t2 == 0 && !self.pipeline.is_held(POST_ONE_SHOT_B0) {
            self.ifr |= IFR_T2;
            self.pipeline.hold(POST_ONE_SHOT_B0);
            log::trace!("{:?} timer 2 fired", self.source);
        }
    }

    /// Negative edge on PB6. Counts timer 2 down in pulse-counting mode.
    pub fn pulse_pb6(&mut self) {
        if self.pulse_counting_mode() {
            self.t2 = self.t2.wrapping_sub(1);
        }
    }
}

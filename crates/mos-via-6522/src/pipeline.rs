//! One-cycle edge pipeline.
//!
//! Every pending effect is a bit in `delay`. Each cycle the whole mask
//! shifts one position left, so a condition scheduled at stage 0 becomes
//! visible at stage 1 one cycle later (and at stage 2 the cycle after
//! that, for the three-stage timer reload). Bits held in `feed` are
//! re-injected into `delay` every cycle, which turns a one-shot edge into
//! a level.
//!
//! Stage-0 bits can only enter `delay` through [`Pipeline::schedule`] or
//! `feed`; a bit shifted out of the last stage of one condition is masked
//! off before it can land on the next condition's stage 0.

/// T1 counts this cycle.
pub const COUNT_A0: u64 = 1 << 0;
pub const COUNT_A1: u64 = 1 << 1;
/// T2 counts this cycle.
pub const COUNT_B0: u64 = 1 << 2;
pub const COUNT_B1: u64 = 1 << 3;
/// Free-run reload of T1 from its latch.
pub const RELOAD_A0: u64 = 1 << 4;
/// Reached only by shifting from stage 0; the timers never check it.
#[allow(dead_code)]
pub const RELOAD_A1: u64 = 1 << 5;
pub const RELOAD_A2: u64 = 1 << 6;
/// T1 already fired since the last latch-to-counter transfer.
pub const POST_ONE_SHOT_A0: u64 = 1 << 7;
/// T2 already fired since the last high-byte write.
pub const POST_ONE_SHOT_B0: u64 = 1 << 8;
/// An enabled interrupt flag is pending.
pub const INTERRUPT0: u64 = 1 << 9;
pub const INTERRUPT1: u64 = 1 << 10;
/// Drive CA2 high.
pub const SET_CA2_OUT0: u64 = 1 << 11;
pub const SET_CA2_OUT1: u64 = 1 << 12;
/// Drive CA2 low.
pub const CLEAR_CA2_OUT0: u64 = 1 << 13;
pub const CLEAR_CA2_OUT1: u64 = 1 << 14;
/// Drive CB2 high.
pub const SET_CB2_OUT0: u64 = 1 << 15;
pub const SET_CB2_OUT1: u64 = 1 << 16;
/// Drive CB2 low.
pub const CLEAR_CB2_OUT0: u64 = 1 << 17;
pub const CLEAR_CB2_OUT1: u64 = 1 << 18;

/// Bits that survive a shift: everything except stage 0 of each condition,
/// the feed-only markers and whatever falls off the top.
const CLEAR_BITS: u64 = !(COUNT_A0
    | COUNT_B0
    | RELOAD_A0
    | POST_ONE_SHOT_A0
    | POST_ONE_SHOT_B0
    | INTERRUPT0
    | SET_CA2_OUT0
    | CLEAR_CA2_OUT0
    | SET_CB2_OUT0
    | CLEAR_CB2_OUT0
    | (CLEAR_CB2_OUT1 << 1));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pipeline {
    /// Conditions in flight.
    delay: u64,
    /// Conditions re-injected every cycle.
    feed: u64,
}

impl Pipeline {
    #[must_use]
    pub const fn new() -> Self {
        Self { delay: 0, feed: 0 }
    }

    /// Rebuild a pipeline from persisted masks.
    #[must_use]
    pub const fn from_raw(delay: u64, feed: u64) -> Self {
        Self { delay, feed }
    }

    /// Put `bits` in flight for the current cycle.
    pub fn schedule(&mut self, bits: u64) {
        self.delay |= bits;
    }

    /// Drop `bits` from the in-flight set.
    pub fn cancel(&mut self, bits: u64) {
        self.delay &= !bits;
    }

    /// Keep re-injecting `bits` every cycle.
    pub fn hold(&mut self, bits: u64) {
        self.feed |= bits;
    }

    /// Stop re-injecting `bits`.
    pub fn release(&mut self, bits: u64) {
        self.feed &= !bits;
    }

    #[must_use]
    pub fn is_active(&self, bits: u64) -> bool {
        self.delay & bits != 0
    }

    #[must_use]
    pub fn is_held(&self, bits: u64) -> bool {
        self.feed & bits != 0
    }

    /// Move every in-flight condition one stage on and re-inject the feed.
    pub fn advance(&mut self) {
        self.delay = ((self.delay << 1) & CLEAR_BITS) | self.feed;
    }

    #[must_use]
    pub fn delay(&self) -> u64 {
        self.delay
    }

    #[must_use]
    pub fn feed(&self) -> u64 {
        self.feed
    }
}

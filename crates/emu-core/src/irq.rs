//! Shared, source-tagged interrupt request line.
//!
//! The 6502 IRQ input is open-collector: any number of chips can hold it
//! low and it only goes high again once every one of them lets go. Each
//! holder is identified by an [`IrqSource`] tag, so one chip releasing its
//! request can never clobber another chip's.

/// Identity of a device that can hold the IRQ line low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrqSource {
    /// Drive VIA1 (serial bus interface).
    Via1,
    /// Drive VIA2 (disk controller).
    Via2,
    /// ATN edge on the serial bus, acknowledged by reading VIA1 port A.
    Atn,
}

impl IrqSource {
    /// Every source, in bit order.
    pub const ALL: [IrqSource; 3] = [IrqSource::Via1, IrqSource::Via2, IrqSource::Atn];

    const fn mask(self) -> u8 {
        match self {
            IrqSource::Via1 => 0x01,
            IrqSource::Via2 => 0x02,
            IrqSource::Atn => 0x04,
        }
    }
}

/// Registry of who is currently pulling the IRQ line low.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IrqLine {
    /// One bit per [`IrqSource`].
    pulled: u8,
}

impl IrqLine {
    /// A released line with no holders.
    #[must_use]
    pub const fn new() -> Self {
        Self { pulled: 0 }
    }

    /// Pull the line low on behalf of `source`.
    pub fn pull(&mut self, source: IrqSource) {
        if self.pulled & source.mask() == 0 {
            log::trace!("IRQ pulled by {source:?}");
        }
        self.pulled |= source.mask();
    }

    /// Stop pulling the line on behalf of `source`.
    ///
    /// Other sources are unaffected; the line stays low while any remain.
    pub fn release(&mut self, source: IrqSource) {
        if self.pulled & source.mask() != 0 {
            log::trace!("IRQ released by {source:?}");
        }
        self.pulled &= !source.mask();
    }

    /// True while at least one source holds the line low.
    #[must_use]
    pub fn is_asserted(&self) -> bool {
        self.pulled != 0
    }

    /// True if `source` is currently holding the line low.
    #[must_use]
    pub fn is_pulled_by(&self, source: IrqSource) -> bool {
        self.pulled & source.mask() != 0
    }

    /// Sources currently holding the line, in bit order.
    pub fn holders(&self) -> impl Iterator<Item = IrqSource> + '_ {
        IrqSource::ALL
            .into_iter()
            .filter(|source| self.is_pulled_by(*source))
    }
}

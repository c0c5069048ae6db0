//! CA1/CA2/CB1/CB2 control lines.
//!
//! PCR layout:
//!
//! | Bits | Field |
//! |------|-------|
//! | 7-5  | CB2 mode |
//! | 4    | CB1 active edge (1 = positive) |
//! | 3-1  | CA2 mode |
//! | 0    | CA1 active edge (1 = positive) |

use crate::{IFR_CA1, IFR_CA2, IFR_CB1, IFR_CB2, Via6522};

/// Decoded 3-bit CA2/CB2 mode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLineMode {
    /// Input, flag on negative edge, cleared by port access.
    InputNegative,
    /// Input, flag on negative edge, port access leaves the flag alone.
    IndependentNegative,
    /// Input, flag on positive edge, cleared by port access.
    InputPositive,
    /// Input, flag on positive edge, port access leaves the flag alone.
    IndependentPositive,
    /// Output goes low on port access and high on the next active C*1 edge.
    Handshake,
    /// Output goes low for one cycle after a port access.
    Pulse,
    /// Output held low.
    ManualLow,
    /// Output held high.
    ManualHigh,
}

impl ControlLineMode {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => ControlLineMode::InputNegative,
            1 => ControlLineMode::IndependentNegative,
            2 => ControlLineMode::InputPositive,
            3 => ControlLineMode::IndependentPositive,
            4 => ControlLineMode::Handshake,
            5 => ControlLineMode::Pulse,
            6 => ControlLineMode::ManualLow,
            _ => ControlLineMode::ManualHigh,
        }
    }

    #[must_use]
    pub const fn is_input(self) -> bool {
        matches!(
            self,
            ControlLineMode::InputNegative
                | ControlLineMode::IndependentNegative
                | ControlLineMode::InputPositive
                | ControlLineMode::IndependentPositive
        )
    }

    /// Port access clears the C*2 interrupt flag.
    #[must_use]
    pub const fn clears_flag_on_access(self) -> bool {
        matches!(
            self,
            ControlLineMode::InputNegative
                | ControlLineMode::InputPositive
                | ControlLineMode::Handshake
                | ControlLineMode::Pulse
        )
    }

    const fn positive_edge(self) -> bool {
        matches!(
            self,
            ControlLineMode::InputPositive | ControlLineMode::IndependentPositive
        )
    }
}

/// True when `old -> new` is the selected edge.
fn is_active_edge(positive: bool, old: bool, new: bool) -> bool {
    if positive { !old && new } else { old && !new }
}

impl Via6522 {
    #[must_use]
    pub fn ca2_mode(&self) -> ControlLineMode {
        ControlLineMode::from_bits(self.pcr >> 1)
    }

    #[must_use]
    pub fn cb2_mode(&self) -> ControlLineMode {
        ControlLineMode::from_bits(self.pcr >> 5)
    }

    /// Drive the CA1 input.
    ///
    /// Sets IFR bit 1 on the edge selected by PCR bit 0. The same edge ends
    /// a CA2 handshake.
    pub fn set_ca1(&mut self, value: bool) {
        if is_active_edge(self.pcr & 0x01 != 0, self.ca1, value) {
            self.ifr |= IFR_CA1;
            if self.ca2_mode() == ControlLineMode::Handshake {
                self.ca2_out = true;
            }
        }
        self.ca1 = value;
    }

    /// Drive the CB1 input.
    ///
    /// Sets IFR bit 4 on the edge selected by PCR bit 4. The same edge ends
    /// a CB2 handshake.
    pub fn set_cb1(&mut self, value: bool) {
        if is_active_edge(self.pcr & 0x10 != 0, self.cb1, value) {
            self.ifr |= IFR_CB1;
            if self.cb2_mode() == ControlLineMode::Handshake {
                self.cb2_out = true;
            }
        }
        self.cb1 = value;
    }

    /// Drive the CA2 input. Ignored while CA2 is an output.
    pub fn set_ca2(&mut self, value: bool) {
        let mode = self.ca2_mode();
        if mode.is_input() && is_active_edge(mode.positive_edge(), self.ca2, value) {
            self.ifr |= IFR_CA2;
        }
        self.ca2 = value;
    }

    /// Drive the CB2 input. Ignored while CB2 is an output.
    pub fn set_cb2(&mut self, value: bool) {
        let mode = self.cb2_mode();
        if mode.is_input() && is_active_edge(mode.positive_edge(), self.cb2, value) {
            self.ifr |= IFR_CB2;
        }
        self.cb2 = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::IrqSource;

    #[test]
    fn mode_decode_table() {
        assert_eq!(ControlLineMode::from_bits(0), ControlLineMode::InputNegative);
        assert_eq!(ControlLineMode::from_bits(5), ControlLineMode::Pulse);
        assert_eq!(ControlLineMode::from_bits(0x0F), ControlLineMode::ManualHigh);

        // Independent modes are the ones that leave the flag alone
        let clearing: Vec<u8> = (0..8)
            .filter(|&m| ControlLineMode::from_bits(m).clears_flag_on_access())
            .collect();
        assert_eq!(clearing, vec![0, 2, 4, 5]);
    }

    #[test]
    fn ca1_negative_edge() {
        let mut via = Via6522::new(IrqSource::Via1);
        via.pcr = 0x00;
        via.set_ca1(true);
        assert_eq!(via.ifr & IFR_CA1, 0); // Rising edge ignored
        via.set_ca1(false);
        assert_ne!(via.ifr & IFR_CA1, 0);
    }

    #[test]
    fn cb1_positive_edge() {
        let mut via = Via6522::new(IrqSource::Via1);
        via.pcr = 0x10;
        via.set_cb1(true);
        assert_ne!(via.ifr & IFR_CB1, 0);
    }

    #[test]
    fn ca1_edge_ends_handshake() {
        let mut via = Via6522::new(IrqSource::Via1);
        via.pcr = 0x09; // CA1 positive, CA2 handshake
        via.ca2_out = false;
        via.set_ca1(true);
        assert!(via.ca2_out);
    }

    #[test]
    fn ca2_input_edges_follow_mode() {
        let mut via = Via6522::new(IrqSource::Via1);
        via.pcr = 0x04; // CA2 input, positive edge
        via.set_ca2(true);
        assert_ne!(via.ifr & IFR_CA2, 0);

        via.ifr = 0;
        via.pcr = 0x0E; // CA2 manual high output
        via.set_ca2(false);
        via.set_ca2(true);
        assert_eq!(via.ifr, 0);
    }

    #[test]
    fn cb2_negative_edge() {
        let mut via = Via6522::new(IrqSource::Via1);
        via.pcr = 0x20; // CB2 independent, negative edge
        via.set_cb2(true);
        via.set_cb2(false);
        assert_ne!(via.ifr & IFR_CB2, 0);
    }
}

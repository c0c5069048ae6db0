//! IEC serial bus between the C64 and the 1541.
//!
//! Three open-collector lines: ATN, CLK, DATA. Each side can pull a line
//! low on its own; a line reads high only when nobody pulls it.
//!
//! The drive side drives the bus through VIA1 port B:
//!
//! | Bit | Direction | Meaning |
//! |-----|-----------|---------|
//! | 0   | in  | DATA in (1 = line low) |
//! | 1   | out | DATA out (1 = pull low) |
//! | 2   | in  | CLK in (1 = line low) |
//! | 3   | out | CLK out (1 = pull low) |
//! | 4   | out | ATN acknowledge |
//! | 5-6 | in  | Device address jumpers |
//! | 7   | in  | ATN in (1 = line low) |
//!
//! ATN acknowledge feeds an XOR gate with the ATN line: DATA is pulled
//! low whenever the acknowledge bit disagrees with ATN being asserted.

/// The drive's view of the serial bus.
pub trait SerialBus {
    /// ATN level (true = high, released).
    fn atn_line(&self) -> bool;

    /// CLK level (true = high, released).
    fn clock_line(&self) -> bool;

    /// DATA level (true = high, released).
    fn data_line(&self) -> bool;

    /// VIA1 port B output changed; recompute what the drive pulls.
    fn update_device_pins(&mut self, orb: u8, ddrb: u8);
}

/// Open-collector model with two participants: the C64 and one drive.
#[derive(Debug, Clone, Default)]
pub struct IecBus {
    c64_atn: bool,
    c64_clk: bool,
    c64_data: bool,
    drive_clk: bool,
    drive_data: bool,
    /// ATN acknowledge output of the drive.
    drive_atna: bool,
}

impl IecBus {
    /// All lines released (high).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- C64 side ---

    /// Set whether the C64 pulls ATN low.
    pub fn set_c64_atn(&mut self, pull_low: bool) {
        self.c64_atn = pull_low;
    }

    /// Set whether the C64 pulls CLK low.
    pub fn set_c64_clk(&mut self, pull_low: bool) {
        self.c64_clk = pull_low;
    }

    /// Set whether the C64 pulls DATA low.
    pub fn set_c64_data(&mut self, pull_low: bool) {
        self.c64_data = pull_low;
    }

    // --- Line state (true = high, false = low) ---

    #[must_use]
    pub fn atn(&self) -> bool {
        !self.c64_atn
    }

    #[must_use]
    pub fn clk(&self) -> bool {
        !self.c64_clk && !self.drive_clk
    }

    #[must_use]
    pub fn data(&self) -> bool {
        let atn_ack = self.drive_atna != !self.atn();
        !self.c64_data && !self.drive_data && !atn_ack
    }
}

impl SerialBus for IecBus {
    fn atn_line(&self) -> bool {
        self.atn()
    }

    fn clock_line(&self) -> bool {
        self.clk()
    }

    fn data_line(&self) -> bool {
        self.data()
    }

    fn update_device_pins(&mut self, orb: u8, ddrb: u8) {
        // Pins configured as inputs don't drive the inverters
        let out = orb & ddrb;
        self.drive_data = out & 0x02 != 0;
        self.drive_clk = out & 0x08 != 0;
        self.drive_atna = out & 0x10 != 0;
        log::trace!(
            "IEC device pins: CLK {} DATA {} ATNA {}",
            u8::from(self.drive_clk),
            u8::from(self.drive_data),
            u8::from(self.drive_atna)
        );
    }
}

//! Bank mapping: which 4K blocks of the CPU address space are overlaid by
//! cartridge ROM.
//!
//! Banking a chip in copies its bytes into a flat 32K window covering
//! $8000-$FFFF and marks the blocks it covers. A bus read then needs one
//! flag lookup to decide between cartridge ROM and whatever lies beneath.
//! Banking a chip out only drops the flags; stale bytes stay in the window.

use crate::chips::{ChipBankStore, MAX_CHIPS, ROM_WINDOW_START};
use crate::crt::{CartridgeType, CrtContainer};
use crate::port::{CartridgeMode, ExpansionPort};
use crate::CartridgeError;

/// Size of the overlay window ($8000-$FFFF).
pub const ROM_WINDOW_SIZE: usize = 0x8000;

/// Number of 4K blocks in the CPU address space.
pub const BLOCKS: usize = 16;

/// A cartridge plugged into the expansion port.
#[derive(Debug, Clone)]
pub struct Cartridge {
    /// Hardware type. Not part of the saved state.
    pub(crate) cartridge_type: CartridgeType,
    /// GAME line (true = high, inactive).
    pub(crate) game_line: bool,
    /// EXROM line (true = high, inactive).
    pub(crate) exrom_line: bool,
    pub(crate) chips: ChipBankStore,
    /// Overlay window for $8000-$FFFF.
    pub(crate) rom: Box<[u8]>,
    /// One flag per 4K block: ROM supplies this block.
    pub(crate) blended_in: [bool; BLOCKS],
    /// Chip most recently banked in.
    pub(crate) last_blended_in: Option<u8>,
}

impl Cartridge {
    /// An empty cartridge of a supported type, both lines high.
    pub fn new(cartridge_type: CartridgeType) -> Result<Self, CartridgeError> {
        if !cartridge_type.is_supported() {
            return Err(CartridgeError::UnsupportedType(cartridge_type.id()));
        }
        Ok(Self {
            cartridge_type,
            game_line: true,
            exrom_line: true,
            chips: ChipBankStore::new(),
            rom: vec![0; ROM_WINDOW_SIZE].into_boxed_slice(),
            blended_in: [false; BLOCKS],
            last_blended_in: None,
        })
    }

    /// Build a cartridge from a CRT container: lines from the header, then
    /// CHIP packet `i` into slot `i`.
    pub fn from_crt(container: &CrtContainer) -> Result<Self, CartridgeError> {
        if container.chips.len() > MAX_CHIPS {
            return Err(CartridgeError::TooManyChips(container.chips.len()));
        }
        let mut cartridge = Self::new(container.cartridge_type)?;
        cartridge.game_line = container.game;
        cartridge.exrom_line = container.exrom;
        for (index, packet) in container.chips.iter().enumerate() {
            cartridge.load_chip(index, packet.load_address, &packet.data);
        }
        Ok(cartridge)
    }

    /// Store a chip image in slot `index`. Bad placements are skipped with
    /// a warning; see [`ChipBankStore::load_chip`].
    pub fn load_chip(&mut self, index: usize, start: u16, data: &[u8]) -> bool {
        self.chips.load_chip(index, start, data)
    }

    /// Overlay chip `index` onto the address space.
    ///
    /// Does nothing if `index` was the last chip banked in.
    ///
    /// # Panics
    ///
    /// If slot `index` is empty.
    pub fn bank_in(&mut self, index: usize) {
        assert!(index < MAX_CHIPS, "chip index {index} out of range");
        if self.last_blended_in == Some(index as u8) {
            return;
        }
        let Some(chip) = self.chips.get(index) else {
            panic!("bank-in of empty chip slot {index}");
        };

        let offset = usize::from(chip.start() - ROM_WINDOW_START);
        self.rom[offset..offset + chip.data().len()].copy_from_slice(chip.data());
        for block in chip.blocks() {
            self.blended_in[block] = true;
        }
        self.last_blended_in = Some(index as u8);

        log::debug!(
            "Chip {index} banked in (start: ${:04X} size: {} KB) blocks {:?}",
            chip.start(),
            chip.data().len() / 1024,
            self.blended_in_blocks()
        );
    }

    /// Remove chip `index`'s blocks from the overlay.
    ///
    /// The window keeps its bytes and the chip stays recorded as the last
    /// one banked in.
    ///
    /// # Panics
    ///
    /// If slot `index` is empty.
    pub fn bank_out(&mut self, index: usize) {
        assert!(index < MAX_CHIPS, "chip index {index} out of range");
        let Some(chip) = self.chips.get(index) else {
            panic!("bank-out of empty chip slot {index}");
        };

        for block in chip.blocks() {
            self.blended_in[block] = false;
        }

        log::debug!(
            "Chip {index} banked out (start: ${:04X} size: {} KB) blocks {:?}",
            chip.start(),
            chip.data().len() / 1024,
            self.blended_in_blocks()
        );
    }

    /// Power on: bank in chip 0 and tell the port where both lines stand.
    pub fn powerup(&mut self, port: &mut impl ExpansionPort) {
        if self.chips.is_populated(0) {
            self.bank_in(0);
        }
        port.game_line_changed(self.game_line);
        port.exrom_line_changed(self.exrom_line);
    }

    /// Reset: bank in chip 0.
    pub fn reset(&mut self) {
        if self.chips.is_populated(0) {
            self.bank_in(0);
        }
    }

    pub fn set_game_line(&mut self, value: bool, port: &mut impl ExpansionPort) {
        self.game_line = value;
        port.game_line_changed(value);
    }

    pub fn set_exrom_line(&mut self, value: bool, port: &mut impl ExpansionPort) {
        self.exrom_line = value;
        port.exrom_line_changed(value);
    }

    /// Bus read: the overlay byte if cartridge ROM covers `addr`, otherwise
    /// `None` and the caller reads RAM or system ROM.
    #[must_use]
    pub fn peek(&self, addr: u16) -> Option<u8> {
        if addr >= ROM_WINDOW_START && self.is_blended_in(addr) {
            Some(self.rom[usize::from(addr - ROM_WINDOW_START)])
        } else {
            None
        }
    }

    /// True if the 4K block holding `addr` is overlaid.
    #[must_use]
    pub fn is_blended_in(&self, addr: u16) -> bool {
        self.blended_in[usize::from(addr >> 12)]
    }

    #[must_use]
    pub fn blended_in(&self) -> &[bool; BLOCKS] {
        &self.blended_in
    }

    /// Indices of overlaid blocks, for diagnostics.
    fn blended_in_blocks(&self) -> Vec<usize> {
        (0..BLOCKS).filter(|&b| self.blended_in[b]).collect()
    }

    #[must_use]
    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    #[must_use]
    pub fn last_blended_in(&self) -> Option<u8> {
        self.last_blended_in
    }

    #[must_use]
    pub fn cartridge_type(&self) -> CartridgeType {
        self.cartridge_type
    }

    #[must_use]
    pub fn game_line(&self) -> bool {
        self.game_line
    }

    #[must_use]
    pub fn exrom_line(&self) -> bool {
        self.exrom_line
    }

    /// Memory configuration the current lines select.
    #[must_use]
    pub fn mode(&self) -> CartridgeMode {
        CartridgeMode::from_lines(self.exrom_line, self.game_line)
    }

    #[must_use]
    pub fn chips(&self) -> &ChipBankStore {
        &self.chips
    }

    #[must_use]
    pub fn number_of_chips(&self) -> usize {
        self.chips.number_of_chips()
    }

    #[must_use]
    pub fn number_of_bytes(&self) -> usize {
        self.chips.number_of_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crt::{parse_crt, tests::make_chip, tests::make_crt_header};

    #[derive(Default)]
    struct PortLog {
        events: Vec<(&'static str, bool)>,
    }

    impl ExpansionPort for PortLog {
        fn game_line_changed(&mut self, game: bool) {
            self.events.push(("game", game));
        }
        fn exrom_line_changed(&mut self, exrom: bool) {
            self.events.push(("exrom", exrom));
        }
    }

    fn normal() -> Cartridge {
        Cartridge::new(CartridgeType::Normal).expect("supported")
    }

    #[test]
    fn bank_in_copies_and_marks_blocks() {
        let mut cart = normal();
        cart.load_chip(0, 0xA000, &[0x5A; 0x2000]);
        cart.bank_in(0);

        assert_eq!(cart.rom()[0x2000], 0x5A);
        assert_eq!(cart.rom()[0x3FFF], 0x5A);
        assert_eq!(cart.rom()[0x1FFF], 0x00);
        let blocks: Vec<usize> = (0..BLOCKS).filter(|&b| cart.blended_in()[b]).collect();
        assert_eq!(blocks, vec![0xA, 0xB]);
        assert_eq!(cart.last_blended_in(), Some(0));
    }

    #[test]
    fn repeated_bank_in_skips_the_copy() {
        let mut cart = normal();
        cart.load_chip(0, 0x8000, &[0x11; 0x1000]);
        cart.bank_in(0);

        // Slot 0 now holds different bytes, but chip 0 is already current
        cart.load_chip(0, 0x8000, &[0x22; 0x1000]);
        cart.bank_in(0);
        assert_eq!(cart.peek(0x8000), Some(0x11));
    }

    #[test]
    fn bank_out_clears_only_its_blocks() {
        let mut cart = normal();
        cart.load_chip(0, 0x8000, &[1; 0x2000]);
        cart.load_chip(1, 0xA000, &[2; 0x2000]);
        cart.bank_in(0);
        cart.bank_in(1);

        cart.bank_out(1);
        let blocks: Vec<usize> = (0..BLOCKS).filter(|&b| cart.blended_in()[b]).collect();
        assert_eq!(blocks, vec![8, 9]);
        // Window bytes and last chip survive
        assert_eq!(cart.rom()[0x2000], 2);
        assert_eq!(cart.last_blended_in(), Some(1));
    }

    #[test]
    fn bank_in_overwrites_without_clearing() {
        let mut cart = normal();
        cart.load_chip(0, 0x8000, &[0xAA; 0x2000]);
        cart.load_chip(1, 0x9000, &[0xBB; 0x0800]);
        cart.bank_in(0);
        cart.bank_in(1);
        assert_eq!(cart.peek(0x8FFF), Some(0xAA));
        assert_eq!(cart.peek(0x9000), Some(0xBB));
        assert_eq!(cart.peek(0x9800), Some(0xAA)); // Stale byte from chip 0
    }

    #[test]
    #[should_panic(expected = "empty chip slot 2")]
    fn bank_in_empty_slot_panics() {
        normal().bank_in(2);
    }

    #[test]
    fn peek_falls_through_outside_overlay() {
        let mut cart = normal();
        cart.load_chip(0, 0x8000, &[0xEA; 0x2000]);
        assert_eq!(cart.peek(0x8000), None); // Not banked in yet
        cart.bank_in(0);
        assert_eq!(cart.peek(0x8000), Some(0xEA));
        assert_eq!(cart.peek(0xA000), None);
        assert_eq!(cart.peek(0x1000), None);
    }

    #[test]
    fn powerup_banks_chip0_and_notifies() {
        let mut cart = normal();
        cart.game_line = true;
        cart.exrom_line = false;
        cart.load_chip(0, 0x8000, &[0x42; 0x2000]);

        let mut port = PortLog::default();
        cart.powerup(&mut port);
        assert_eq!(cart.peek(0x9FFF), Some(0x42));
        assert_eq!(port.events, vec![("game", true), ("exrom", false)]);
    }

    #[test]
    fn powerup_without_chips_still_notifies() {
        let mut cart = normal();
        let mut port = PortLog::default();
        cart.powerup(&mut port);
        assert_eq!(cart.last_blended_in(), None);
        assert_eq!(port.events.len(), 2);
    }

    #[test]
    fn reset_rebanks_chip0_after_switch() {
        let mut cart = normal();
        cart.load_chip(0, 0x8000, &[0x01; 0x2000]);
        cart.load_chip(1, 0x8000, &[0x02; 0x2000]);
        cart.bank_in(1);
        cart.reset();
        assert_eq!(cart.peek(0x8000), Some(0x01));
        assert_eq!(cart.last_blended_in(), Some(0));
    }

    #[test]
    fn line_setters_notify() {
        let mut cart = normal();
        let mut port = PortLog::default();
        cart.set_exrom_line(false, &mut port);
        assert_eq!(cart.mode(), CartridgeMode::EightK);
        cart.set_game_line(false, &mut port);
        assert_eq!(cart.mode(), CartridgeMode::SixteenK);
        assert_eq!(port.events, vec![("exrom", false), ("game", false)]);
    }

    #[test]
    fn from_crt_loads_packets_in_order() {
        let mut crt = make_crt_header(0, 0, 0);
        crt.extend(make_chip(0, 0x8000, &[0xBB; 8192]));
        crt.extend(make_chip(0, 0xA000, &[0xCC; 8192]));
        // Ultimax ROMH would end past $FFFF and is skipped
        crt.extend(make_chip(0, 0xE000, &[0xDD; 8192]));
        let container = parse_crt(&crt).expect("should parse");

        let cart = Cartridge::from_crt(&container).expect("supported");
        assert_eq!(cart.mode(), CartridgeMode::SixteenK);
        assert_eq!(cart.number_of_chips(), 2);
        assert_eq!(cart.number_of_bytes(), 16384);
        assert_eq!(cart.chips().get(1).map(|c| c.start()), Some(0xA000));
        assert!(!cart.chips().is_populated(2));
    }

    #[test]
    fn from_crt_rejects_unsupported_type() {
        let crt = make_crt_header(32, 0, 0);
        let container = parse_crt(&crt).expect("should parse");
        assert!(matches!(
            Cartridge::from_crt(&container),
            Err(CartridgeError::UnsupportedType(32))
        ));
    }
}

//! Cartridge state persistence and inspection.
//!
//! Layout (little-endian):
//!
//! | Bytes | Item |
//! |-------|------|
//! | 1 | GAME line |
//! | 1 | EXROM line |
//! | 64 x (2 + 2 + n) | chip start, chip size n, chip bytes |
//! | 32768 | overlay window |
//! | 16 | block flags |
//! | 1 | last chip banked in ($FF = none) |
//!
//! An empty slot is written as start 0, size 0 and no bytes. The hardware
//! type is not stored; [`Cartridge::from_state`] takes it from the caller.

use emu_core::{Observable, Snapshot, StateError, StateReader, StateWriter, Value};

use crate::chips::{Chip, MAX_CHIPS, fits_window};
use crate::crt::CartridgeType;
use crate::mapper::{BLOCKS, Cartridge, ROM_WINDOW_SIZE};
use crate::CartridgeError;

const NO_CHIP: u8 = 0xFF;

impl Cartridge {
    /// Rebuild a cartridge of `cartridge_type` from a saved state.
    pub fn from_state(cartridge_type: CartridgeType, data: &[u8]) -> Result<Self, CartridgeError> {
        let mut cartridge = Self::new(cartridge_type)?;
        cartridge.load_from_buffer(data)?;
        Ok(cartridge)
    }
}

impl Snapshot for Cartridge {
    fn state_size(&self) -> usize {
        let chips: usize = self
            .chips
            .slots()
            .map(|slot| 4 + slot.map_or(0, |chip| chip.data().len()))
            .sum();
        2 + chips + ROM_WINDOW_SIZE + BLOCKS + 1
    }

    fn write_state(&self, w: &mut StateWriter) {
        w.write_bool(self.game_line);
        w.write_bool(self.exrom_line);
        for slot in self.chips.slots() {
            match slot {
                Some(chip) => {
                    w.write_u16(chip.start());
                    w.write_u16(chip.size());
                    w.write_block(chip.data());
                }
                None => {
                    w.write_u16(0);
                    w.write_u16(0);
                }
            }
        }
        w.write_block(&self.rom);
        for &flag in &self.blended_in {
            w.write_bool(flag);
        }
        w.write_u8(self.last_blended_in.unwrap_or(NO_CHIP));
    }

    fn read_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        self.game_line = r.read_bool()?;
        self.exrom_line = r.read_bool()?;
        for index in 0..MAX_CHIPS {
            let start = r.read_u16()?;
            let size = usize::from(r.read_u16()?);
            let chip = if size > 0 {
                if !fits_window(start, size) {
                    return Err(StateError::InvalidChip {
                        index,
                        start,
                        size: size as u16,
                    });
                }
                Some(Chip::new(start, r.read_vec(size)?))
            } else {
                None
            };
            self.chips.set_slot(index, chip);
        }
        r.read_block(&mut self.rom)?;
        for flag in &mut self.blended_in {
            *flag = r.read_bool()?;
        }
        self.last_blended_in = match r.read_u8()? {
            NO_CHIP => None,
            index => Some(index),
        };
        log::debug!(
            "Cartridge state restored: {} chips, {} bytes",
            self.number_of_chips(),
            self.number_of_bytes()
        );
        Ok(())
    }
}

impl Observable for Cartridge {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("chip.") {
            let (index, field) = rest.split_once('.')?;
            let chip = self.chips.get(index.parse().ok()?)?;
            return match field {
                "start" => Some(chip.start().into()),
                "size" => Some(chip.size().into()),
                _ => None,
            };
        }

        match path {
            "type" => Some(self.cartridge_type.id().into()),
            "game" => Some(self.game_line.into()),
            "exrom" => Some(self.exrom_line.into()),
            "blended_in" => Some(self.blended_in.to_vec().into()),
            "last_blended_in" => Some(self.last_blended_in.unwrap_or(NO_CHIP).into()),
            "chips" => Some((self.number_of_chips() as u8).into()),
            "bytes" => Some((self.number_of_bytes() as u64).into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "type",
            "game",
            "exrom",
            "blended_in",
            "last_blended_in",
            "chips",
            "bytes",
            "chip.<n>.start",
            "chip.<n>.size",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> Cartridge {
        let mut cart = Cartridge::new(CartridgeType::Ocean1).expect("supported");
        cart.exrom_line = false;
        cart.load_chip(0, 0x8000, &[0x10; 0x2000]);
        cart.load_chip(1, 0x8000, &[0x20; 0x2000]);
        cart.load_chip(7, 0xA000, &[0x30; 0x1000]);
        cart.bank_in(1);
        cart.bank_in(7);
        cart
    }

    #[test]
    fn size_accounts_for_every_slot() {
        let empty = Cartridge::new(CartridgeType::Normal).expect("supported");
        assert_eq!(empty.state_size(), 2 + 64 * 4 + 0x8000 + 16 + 1);
        assert_eq!(empty.save_to_buffer().len(), empty.state_size());

        let cart = loaded();
        assert_eq!(cart.state_size(), 2 + 64 * 4 + 0x5000 + 0x8000 + 16 + 1);
    }

    #[test]
    fn layout_prefix() {
        let data = loaded().save_to_buffer();
        assert_eq!(data[0], 1); // GAME
        assert_eq!(data[1], 0); // EXROM
        assert_eq!(&data[2..6], &[0x00, 0x80, 0x00, 0x20]);
        assert_eq!(*data.last().expect("non-empty"), 7);
    }

    #[test]
    fn round_trip_restores_everything() {
        let original = loaded();
        let data = original.save_to_buffer();

        let restored = Cartridge::from_state(CartridgeType::Ocean1, &data).expect("complete state");
        assert_eq!(restored.game_line(), original.game_line());
        assert_eq!(restored.exrom_line(), original.exrom_line());
        assert_eq!(restored.chips(), original.chips());
        assert_eq!(restored.rom(), original.rom());
        assert_eq!(restored.blended_in(), original.blended_in());
        assert_eq!(restored.last_blended_in(), Some(7));
        assert_eq!(restored.peek(0xA000), Some(0x30));
    }

    #[test]
    fn no_chip_banked_in_uses_sentinel() {
        let cart = Cartridge::new(CartridgeType::Normal).expect("supported");
        let data = cart.save_to_buffer();
        assert_eq!(*data.last().expect("non-empty"), NO_CHIP);

        let restored = Cartridge::from_state(CartridgeType::Normal, &data).expect("complete state");
        assert_eq!(restored.last_blended_in(), None);
    }

    #[test]
    fn truncated_state_is_an_error() {
        let data = loaded().save_to_buffer();
        assert!(matches!(
            Cartridge::from_state(CartridgeType::Ocean1, &data[..100]),
            Err(CartridgeError::State(StateError::Truncated { .. }))
        ));
    }

    #[test]
    fn misplaced_chip_is_rejected() {
        let data = loaded().save_to_buffer();

        // Slot 1 starts right after the first chip's bytes
        let slot1 = 2 + 4 + 0x2000;
        let mut low = data.clone();
        low[slot1..slot1 + 2].copy_from_slice(&0x1000u16.to_le_bytes());
        assert!(matches!(
            Cartridge::from_state(CartridgeType::Ocean1, &low),
            Err(CartridgeError::State(StateError::InvalidChip {
                index: 1,
                start: 0x1000,
                size: 0x2000
            }))
        ));

        let mut past_end = data;
        past_end[slot1..slot1 + 2].copy_from_slice(&0xF000u16.to_le_bytes());
        assert!(matches!(
            Cartridge::from_state(CartridgeType::Ocean1, &past_end),
            Err(CartridgeError::State(StateError::InvalidChip { index: 1, .. }))
        ));
    }

    #[test]
    fn queries() {
        let cart = loaded();
        assert_eq!(cart.query("exrom"), Some(Value::Bool(false)));
        assert_eq!(cart.query("chips"), Some(Value::U8(3)));
        assert_eq!(cart.query("bytes"), Some(Value::U64(0x5000)));
        assert_eq!(cart.query("chip.7.start"), Some(Value::U16(0xA000)));
        assert_eq!(cart.query("chip.7.size"), Some(Value::U16(0x1000)));
        assert_eq!(cart.query("chip.2.start"), None);
        assert_eq!(cart.query("chip.x.start"), None);
        assert_eq!(cart.query("type"), Some(Value::U16(5)));

        let Some(Value::Array(blocks)) = cart.query("blended_in") else {
            panic!("blended_in should be an array");
        };
        assert_eq!(blocks.len(), 16);
        assert_eq!(blocks[8], Value::Bool(true));
        assert_eq!(blocks[0xA], Value::Bool(true));
        assert_eq!(blocks[0xC], Value::Bool(false));
    }
}

//! Chip packet storage.
//!
//! A cartridge carries up to 64 ROM images ("chips"), each with the CPU
//! address it wants to appear at. Slots are independent; a slot is either
//! empty or owns exactly its chip's bytes.

/// Number of chip slots on a cartridge.
pub const MAX_CHIPS: usize = 64;

/// Lowest address a chip may be mapped to.
pub const ROM_WINDOW_START: u16 = 0x8000;

/// True when `size` bytes starting at `start` stay inside $8000-$FFFF.
pub(crate) fn fits_window(start: u16, size: usize) -> bool {
    start >= ROM_WINDOW_START && usize::from(0xFFFF - start) >= size
}

/// One ROM image and its placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    /// First CPU address covered.
    start: u16,
    /// Image bytes; the length is the chip size.
    data: Vec<u8>,
}

impl Chip {
    pub(crate) fn new(start: u16, data: Vec<u8>) -> Self {
        Self { start, data }
    }

    #[must_use]
    pub fn start(&self) -> u16 {
        self.start
    }

    /// Size in bytes. Placement checks keep this within 16 bits.
    #[must_use]
    pub fn size(&self) -> u16 {
        self.data.len() as u16
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 4K blocks the chip claims when banked in: `start >> 12` up to, but
    /// not including, `(start + size) >> 12`.
    #[must_use]
    pub fn blocks(&self) -> std::ops::Range<usize> {
        let start = usize::from(self.start);
        let end = start + self.data.len();
        (start >> 12)..(end >> 12)
    }
}

/// The 64 chip slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipBankStore {
    slots: [Option<Chip>; MAX_CHIPS],
}

impl ChipBankStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Place a copy of `data` at `start` in slot `index`, replacing what
    /// was there.
    ///
    /// A chip starting below $8000, an empty image, or one that would run
    /// past $FFFF is skipped with a warning and leaves the slot untouched.
    /// Returns whether the chip was stored.
    pub fn load_chip(&mut self, index: usize, start: u16, data: &[u8]) -> bool {
        assert!(index < MAX_CHIPS, "chip index {index} out of range");

        if start < ROM_WINDOW_START {
            log::warn!("Ignoring chip {index}: start address too low (${start:04X})");
            return false;
        }
        if data.is_empty() || !fits_window(start, data.len()) {
            log::warn!(
                "Ignoring chip {index}: invalid size (start: ${start:04X} size: ${:04X})",
                data.len()
            );
            return false;
        }

        self.slots[index] = Some(Chip::new(start, data.to_vec()));
        log::debug!("Chip {index} in place: {} bytes at ${start:04X}", data.len());
        true
    }

    /// Replace slot `index` without placement checks. Used when restoring
    /// saved state.
    pub(crate) fn set_slot(&mut self, index: usize, chip: Option<Chip>) {
        self.slots[index] = chip;
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Chip> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn is_populated(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Every slot in index order, populated or not.
    pub fn slots(&self) -> impl Iterator<Item = Option<&Chip>> + '_ {
        self.slots.iter().map(Option::as_ref)
    }

    /// Populated slots as `(index, chip)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Chip)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|chip| (i, chip)))
    }

    #[must_use]
    pub fn number_of_chips(&self) -> usize {
        self.iter().count()
    }

    /// Total bytes over all populated slots.
    #[must_use]
    pub fn number_of_bytes(&self) -> usize {
        self.iter().map(|(_, chip)| chip.data.len()).sum()
    }
}

impl Default for ChipBankStore {
    fn default() -> Self {
        Self::new()
    }
}

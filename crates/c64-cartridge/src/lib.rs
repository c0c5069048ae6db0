//! C64 expansion port cartridge.
//!
//! A cartridge holds up to 64 ROM chips and overlays one or more of them
//! onto $8000-$FFFF in 4K blocks. Its EXROM and GAME lines tell the C64's
//! PLA which memory configuration to use:
//!
//! | EXROM | GAME | Configuration |
//! |-------|------|---------------|
//! |   1   |   1  | Off |
//! |   0   |   1  | 8K |
//! |   0   |   0  | 16K |
//! |   1   |   0  | Ultimax |
//!
//! The bus asks [`Cartridge::peek`] first and falls through to RAM or
//! system ROM when it returns `None`. Line changes are pushed to whatever
//! implements [`ExpansionPort`].

mod chips;
mod crt;
mod mapper;
mod port;
mod snapshot;

use thiserror::Error;

pub use chips::{Chip, ChipBankStore, MAX_CHIPS, ROM_WINDOW_START};
pub use crt::{CartridgeType, ChipPacket, CrtContainer, CrtError, parse_crt};
pub use mapper::{BLOCKS, Cartridge, ROM_WINDOW_SIZE};
pub use port::{CartridgeMode, ExpansionPort};

/// Errors building a cartridge.
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error(transparent)]
    Crt(#[from] CrtError),
    #[error("bad cartridge state: {0}")]
    State(#[from] emu_core::StateError),
    #[error("unsupported cartridge type {0}")]
    UnsupportedType(u16),
    #[error("too many CHIP packets: {0}")]
    TooManyChips(usize),
}

/// Parse a CRT file and build its cartridge.
pub fn from_crt_bytes(data: &[u8]) -> Result<Cartridge, CartridgeError> {
    let container = parse_crt(data)?;
    Cartridge::from_crt(&container)
}

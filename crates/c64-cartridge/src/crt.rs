//! CRT cartridge container reader.
//!
//! A CRT file is a 64-byte header followed by CHIP packets. All multi-byte
//! fields are big-endian.
//!
//! | Offset | Size | Header field |
//! |--------|------|--------------|
//! | $00    | 16   | `"C64 CARTRIDGE   "` |
//! | $10    | 4    | Header length |
//! | $14    | 2    | Version |
//! | $16    | 2    | Hardware type |
//! | $18    | 1    | EXROM line |
//! | $19    | 1    | GAME line |
//! | $20    | 32   | Name, zero padded |
//!
//! | Offset | Size | CHIP field |
//! |--------|------|------------|
//! | $00    | 4    | `"CHIP"` |
//! | $04    | 4    | Packet length, header included |
//! | $08    | 2    | Chip type (0 = ROM, 1 = RAM, 2 = Flash) |
//! | $0A    | 2    | Bank |
//! | $0C    | 2    | Load address |
//! | $0E    | 2    | Image size |
//! | $10    | n    | Image data |
//!
//! Only the container is read here; what a hardware type does with its
//! I/O area is up to the cartridge.

use thiserror::Error;

/// CRT file signature.
const CRT_SIGNATURE: &[u8; 16] = b"C64 CARTRIDGE   ";

/// CHIP packet signature.
const CHIP_SIGNATURE: &[u8; 4] = b"CHIP";

const HEADER_SIZE: usize = 0x40;
const CHIP_HEADER_SIZE: usize = 0x10;

/// Malformed CRT container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrtError {
    #[error("CRT file too short for header ({0} bytes)")]
    TooShort(usize),
    #[error("invalid CRT signature")]
    BadSignature,
    #[error("invalid CRT header length: {0}")]
    BadHeaderLength(u32),
    #[error("expected CHIP signature at offset {0}")]
    BadChipSignature(usize),
    #[error("invalid CHIP packet length {length} at offset {offset}")]
    BadChipLength { offset: usize, length: u32 },
    #[error("CHIP image data extends past end of file at offset {0}")]
    ChipDataTruncated(usize),
}

/// Cartridge hardware type from the CRT header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartridgeType {
    /// Type 0: plain 8K/16K/Ultimax ROM.
    Normal,
    /// Type 1.
    ActionReplay,
    /// Type 3.
    FinalCartridgeIii,
    /// Type 4: ROML + ROMH, toggled via $DE00.
    SimonsBasic,
    /// Type 5: up to 64 x 8K banks selected via $DE00.
    Ocean1,
    /// Type 19.
    MagicDesk,
    /// Type 32.
    EasyFlash,
    /// Any other hardware type id.
    Other(u16),
}

impl CartridgeType {
    #[must_use]
    pub fn from_id(id: u16) -> Self {
        match id {
            0 => CartridgeType::Normal,
            1 => CartridgeType::ActionReplay,
            3 => CartridgeType::FinalCartridgeIii,
            4 => CartridgeType::SimonsBasic,
            5 => CartridgeType::Ocean1,
            19 => CartridgeType::MagicDesk,
            32 => CartridgeType::EasyFlash,
            other => CartridgeType::Other(other),
        }
    }

    #[must_use]
    pub fn id(self) -> u16 {
        match self {
            CartridgeType::Normal => 0,
            CartridgeType::ActionReplay => 1,
            CartridgeType::FinalCartridgeIii => 3,
            CartridgeType::SimonsBasic => 4,
            CartridgeType::Ocean1 => 5,
            CartridgeType::MagicDesk => 19,
            CartridgeType::EasyFlash => 32,
            CartridgeType::Other(id) => id,
        }
    }

    /// Types whose ROM layout this crate can map.
    ///
    /// Bank selection through $DE00 is not modelled; the caller decodes
    /// the register and calls [`crate::Cartridge::bank_in`].
    #[must_use]
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            CartridgeType::Normal | CartridgeType::SimonsBasic | CartridgeType::Ocean1
        )
    }
}

/// One CHIP packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipPacket {
    pub chip_type: u16,
    pub bank: u16,
    pub load_address: u16,
    pub data: Vec<u8>,
}

/// A parsed CRT file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrtContainer {
    pub cartridge_type: CartridgeType,
    /// EXROM line (true = high, inactive).
    pub exrom: bool,
    /// GAME line (true = high, inactive).
    pub game: bool,
    pub name: String,
    /// Packets in file order.
    pub chips: Vec<ChipPacket>,
}

/// Read a big-endian u16 from a byte slice.
fn read_be_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

/// Read a big-endian u32 from a byte slice.
fn read_be_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Parse a CRT file.
///
/// Any hardware type is accepted here; whether it can be mapped is decided
/// when the cartridge is built.
pub fn parse_crt(data: &[u8]) -> Result<CrtContainer, CrtError> {
    if data.len() < HEADER_SIZE {
        return Err(CrtError::TooShort(data.len()));
    }
    if &data[0..16] != CRT_SIGNATURE {
        return Err(CrtError::BadSignature);
    }

    let header_len = read_be_u32(data, 0x10);
    if header_len < 0x20 || header_len as usize > data.len() {
        return Err(CrtError::BadHeaderLength(header_len));
    }

    let cartridge_type = CartridgeType::from_id(read_be_u16(data, 0x16));
    let exrom = data[0x18] != 0;
    let game = data[0x19] != 0;

    let mut chips = Vec::new();
    let mut offset = header_len as usize;
    while offset + CHIP_HEADER_SIZE <= data.len() {
        if &data[offset..offset + 4] != CHIP_SIGNATURE {
            return Err(CrtError::BadChipSignature(offset));
        }

        let length = read_be_u32(data, offset + 4);
        if (length as usize) < CHIP_HEADER_SIZE || offset + length as usize > data.len() {
            return Err(CrtError::BadChipLength { offset, length });
        }

        let size = usize::from(read_be_u16(data, offset + 0x0E));
        let image = offset + CHIP_HEADER_SIZE;
        if image + size > data.len() {
            return Err(CrtError::ChipDataTruncated(offset));
        }

        chips.push(ChipPacket {
            chip_type: read_be_u16(data, offset + 0x08),
            bank: read_be_u16(data, offset + 0x0A),
            load_address: read_be_u16(data, offset + 0x0C),
            data: data[image..image + size].to_vec(),
        });
        offset += length as usize;
    }

    let container = CrtContainer {
        cartridge_type,
        exrom,
        game,
        name: crt_name(data),
        chips,
    };
    log::debug!(
        "CRT \"{}\": type {}, {} chip packets, EXROM={} GAME={}",
        container.name,
        cartridge_type.id(),
        container.chips.len(),
        u8::from(exrom),
        u8::from(game)
    );
    Ok(container)
}

/// Extract the cartridge name from a CRT header (up to 32 bytes at offset 0x20).
fn crt_name(data: &[u8]) -> String {
    let name_bytes = &data[0x20..0x40];
    let end = name_bytes
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(name_bytes.len());
    String::from_utf8_lossy(&name_bytes[..end]).trim().to_string()
}

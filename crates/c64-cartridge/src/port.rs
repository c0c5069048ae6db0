//! Expansion port side of the cartridge.

/// Bus logic that must follow the cartridge's GAME and EXROM lines.
pub trait ExpansionPort {
    /// GAME is now `game` (true = high, inactive).
    fn game_line_changed(&mut self, game: bool);

    /// EXROM is now `exrom` (true = high, inactive).
    fn exrom_line_changed(&mut self, exrom: bool);
}

/// C64 memory configuration selected by (EXROM, GAME).
///
/// | EXROM | GAME | Mode |
/// |-------|------|------|
/// |   1   |   1  | No cartridge ROM visible |
/// |   0   |   1  | 8K: ROML at $8000-$9FFF |
/// |   0   |   0  | 16K: ROML at $8000, ROMH at $A000 |
/// |   1   |   0  | Ultimax: ROML at $8000, ROMH at $E000 |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartridgeMode {
    Off,
    EightK,
    SixteenK,
    Ultimax,
}

impl CartridgeMode {
    #[must_use]
    pub fn from_lines(exrom: bool, game: bool) -> Self {
        match (exrom, game) {
            (true, true) => CartridgeMode::Off,
            (false, true) => CartridgeMode::EightK,
            (false, false) => CartridgeMode::SixteenK,
            (true, false) => CartridgeMode::Ultimax,
        }
    }
}

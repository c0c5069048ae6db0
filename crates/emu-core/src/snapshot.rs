//! Byte-level state persistence.
//!
//! Components serialise themselves into a flat little-endian byte stream
//! with a fixed field order. Several components can share one buffer: each
//! one reads or writes exactly [`Snapshot::state_size`] bytes and leaves the
//! cursor positioned for the next.
//!
//! A length mismatch between what a component wrote (or read) and what it
//! claims its state size is means the persistent format itself is broken.
//! That is not recoverable and panics.

use thiserror::Error;

/// Failure reading a state buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The buffer ended before a field could be read.
    #[error("state truncated: {needed} bytes needed at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// A ROM chip that does not fit the cartridge window.
    #[error("invalid chip {index}: start ${start:04X} size ${size:04X}")]
    InvalidChip { index: usize, start: u16, size: u16 },
}

/// Append-only little-endian writer.
#[derive(Debug, Default)]
pub struct StateWriter {
    data: Vec<u8>,
}

impl StateWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.data.push(u8::from(value));
    }

    pub fn write_u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Copy a raw block verbatim.
    pub fn write_block(&mut self, block: &[u8]) {
        self.data.extend_from_slice(block);
    }

    /// Bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

/// Cursor over a state buffer.
#[derive(Debug)]
pub struct StateReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> StateReader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Offset of the next unread byte.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], StateError> {
        if self.remaining() < count {
            return Err(StateError::Truncated {
                offset: self.pos,
                needed: count,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, StateError> {
        Ok(self.take(1)?[0])
    }

    /// Any non-zero byte reads as `true`.
    pub fn read_bool(&mut self) -> Result<bool, StateError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, StateError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, StateError> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(bytes))
    }

    /// Fill `block` from the stream.
    pub fn read_block(&mut self, block: &mut [u8]) -> Result<(), StateError> {
        block.copy_from_slice(self.take(block.len())?);
        Ok(())
    }

    /// Read `len` bytes into a fresh buffer.
    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, StateError> {
        Ok(self.take(len)?.to_vec())
    }
}

/// A component with a fixed-order binary state layout.
pub trait Snapshot {
    /// Exact number of bytes [`Snapshot::write_state`] produces for the
    /// current state.
    fn state_size(&self) -> usize;

    /// Write every state field in layout order.
    fn write_state(&self, writer: &mut StateWriter);

    /// Read every state field in layout order, replacing the current state.
    fn read_state(&mut self, reader: &mut StateReader<'_>) -> Result<(), StateError>;

    /// Append this component's state to a shared writer.
    ///
    /// # Panics
    ///
    /// If the number of bytes written differs from [`Snapshot::state_size`].
    fn save(&self, writer: &mut StateWriter) {
        let start = writer.len();
        self.write_state(writer);
        let written = writer.len() - start;
        log::trace!("state saved ({written} bytes)");
        assert_eq!(
            written,
            self.state_size(),
            "state integrity violation: wrote {written} bytes, expected {}",
            self.state_size()
        );
    }

    /// Restore this component's state from a shared reader.
    ///
    /// # Panics
    ///
    /// If the number of bytes consumed differs from [`Snapshot::state_size`]
    /// of the restored state.
    fn load(&mut self, reader: &mut StateReader<'_>) -> Result<(), StateError> {
        let start = reader.position();
        self.read_state(reader)?;
        let consumed = reader.position() - start;
        log::trace!("state loaded ({consumed} bytes)");
        assert_eq!(
            consumed,
            self.state_size(),
            "state integrity violation: read {consumed} bytes, expected {}",
            self.state_size()
        );
        Ok(())
    }

    /// Serialise into a standalone buffer.
    fn save_to_buffer(&self) -> Vec<u8> {
        let mut writer = StateWriter::with_capacity(self.state_size());
        self.save(&mut writer);
        writer.into_inner()
    }

    /// Restore from the start of `data`, returning the bytes consumed.
    fn load_from_buffer(&mut self, data: &[u8]) -> Result<usize, StateError> {
        let mut reader = StateReader::new(data);
        self.load(&mut reader)?;
        Ok(reader.position())
    }
}

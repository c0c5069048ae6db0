//! Read-only inspection of chip state.
//!
//! Debuggers and tests look at a chip through dotted query paths instead of
//! poking at its fields. A query never changes emulation state, so unlike a
//! CPU-visible register read it can't clear a flag or start a handshake.

use std::fmt;

/// A dynamically-typed value returned by a state query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A single line or flag.
    Bool(bool),
    /// An 8-bit register.
    U8(u8),
    /// A 16-bit counter, latch or address.
    U16(u16),
    /// A raw bit mask wider than 16 bits.
    U64(u64),
    /// Per-block or per-slot values.
    Array(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:#04X}"),
            Value::U16(v) => write!(f, "{v:#06X}"),
            Value::U64(v) => write!(f, "{v:#018X}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::U16(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

/// A component whose state can be inspected by path.
pub trait Observable {
    /// Query one property, e.g. `t1`, `ifr` or `chip.3.start`.
    ///
    /// Returns `None` if the path is not recognised.
    fn query(&self, path: &str) -> Option<Value>;

    /// Every fixed path [`Observable::query`] answers.
    fn query_paths(&self) -> &'static [&'static str];
}

//! Core types shared by the cartridge and drive chip crates.
//!
//! Everything here is single-threaded and cycle-stepped. Components never
//! own their collaborators; they borrow them per call, so a component can
//! only be saved or restored while nothing else is touching it.

mod irq;
mod observable;
mod snapshot;

pub use irq::{IrqLine, IrqSource};
pub use observable::{Observable, Value};
pub use snapshot::{Snapshot, StateError, StateReader, StateWriter};

//! VIA state persistence and inspection.
//!
//! Every item is stored verbatim, in this order (all little-endian):
//!
//! | Bytes | Items |
//! |-------|-------|
//! | 14 x 1 | pa ca1 ca2 ca2_out pb cb1 cb2 cb2_out ddra ddrb ora orb ira irb |
//! | 2 x 2  | t1 t2 |
//! | 10 x 1 | t1_latch_lo t1_latch_hi t2_latch_lo pb7toggle pb7timerOut pcr acr ier ifr sr |
//! | 2 x 8  | delay feed |
//!
//! None of these items survive [`Via6522::reset`]: all of them are zeroed
//! before the power-on defaults go back in.

use emu_core::{Observable, Snapshot, StateError, StateReader, StateWriter, Value};

use crate::Via6522;
use crate::pipeline::Pipeline;

/// Size of a saved VIA state in bytes.
pub const STATE_SIZE: usize = 14 + 2 * 2 + 10 + 2 * 8;

impl Snapshot for Via6522 {
    fn state_size(&self) -> usize {
        STATE_SIZE
    }

    fn write_state(&self, w: &mut StateWriter) {
        w.write_u8(self.pa);
        w.write_bool(self.ca1);
        w.write_bool(self.ca2);
        w.write_bool(self.ca2_out);
        w.write_u8(self.pb);
        w.write_bool(self.cb1);
        w.write_bool(self.cb2);
        w.write_bool(self.cb2_out);
        w.write_u8(self.ddra);
        w.write_u8(self.ddrb);
        w.write_u8(self.ora);
        w.write_u8(self.orb);
        w.write_u8(self.ira);
        w.write_u8(self.irb);
        w.write_u16(self.t1);
        w.write_u16(self.t2);
        w.write_u8(self.t1_latch_lo);
        w.write_u8(self.t1_latch_hi);
        w.write_u8(self.t2_latch_lo);
        w.write_bool(self.pb7toggle);
        w.write_bool(self.pb7_timer_out);
        w.write_u8(self.pcr);
        w.write_u8(self.acr);
        w.write_u8(self.ier);
        w.write_u8(self.ifr);
        w.write_u8(self.sr);
        w.write_u64(self.pipeline.delay());
        w.write_u64(self.pipeline.feed());
    }

    fn read_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        self.pa = r.read_u8()?;
        self.ca1 = r.read_bool()?;
        self.ca2 = r.read_bool()?;
        self.ca2_out = r.read_bool()?;
        self.pb = r.read_u8()?;
        self.cb1 = r.read_bool()?;
        self.cb2 = r.read_bool()?;
        self.cb2_out = r.read_bool()?;
        self.ddra = r.read_u8()?;
        self.ddrb = r.read_u8()?;
        self.ora = r.read_u8()?;
        self.orb = r.read_u8()?;
        self.ira = r.read_u8()?;
        self.irb = r.read_u8()?;
        self.t1 = r.read_u16()?;
        self.t2 = r.read_u16()?;
        self.t1_latch_lo = r.read_u8()?;
        self.t1_latch_hi = r.read_u8()?;
        self.t2_latch_lo = r.read_u8()?;
        self.pb7toggle = r.read_bool()?;
        self.pb7_timer_out = r.read_bool()?;
        self.pcr = r.read_u8()?;
        self.acr = r.read_u8()?;
        // Bit 7 is computed, never stored
        self.ier = r.read_u8()? & 0x7F;
        self.ifr = r.read_u8()? & 0x7F;
        self.sr = r.read_u8()?;
        let delay = r.read_u64()?;
        let feed = r.read_u64()?;
        self.pipeline = Pipeline::from_raw(delay, feed);
        log::debug!("{:?} state restored", self.source);
        Ok(())
    }
}

impl Observable for Via6522 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pa" => Some(self.pa.into()),
            "pb" => Some(self.pb.into()),
            "ddra" => Some(self.ddra.into()),
            "ddrb" => Some(self.ddrb.into()),
            "ora" => Some(self.ora.into()),
            "orb" => Some(self.orb.into()),
            "ira" => Some(self.ira.into()),
            "irb" => Some(self.irb.into()),
            "t1" => Some(self.t1.into()),
            "t2" => Some(self.t2.into()),
            "t1_latch" => Some(self.t1_latch().into()),
            "t2_latch_lo" => Some(self.t2_latch_lo.into()),
            "sr" => Some(self.sr.into()),
            "acr" => Some(self.acr.into()),
            "pcr" => Some(self.pcr.into()),
            "ifr" => Some(self.ifr.into()),
            "ier" => Some(self.ier.into()),
            "irq_pending" => Some(self.irq_pending().into()),
            "ca1" => Some(self.ca1.into()),
            "ca2" => Some(self.ca2.into()),
            "ca2_out" => Some(self.ca2_out.into()),
            "cb1" => Some(self.cb1.into()),
            "cb2" => Some(self.cb2.into()),
            "cb2_out" => Some(self.cb2_out.into()),
            "pb7.toggle" => Some(self.pb7toggle.into()),
            "pb7.timer_out" => Some(self.pb7_timer_out.into()),
            "pipeline.delay" => Some(self.pipeline.delay().into()),
            "pipeline.feed" => Some(self.pipeline.feed().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pa",
            "pb",
            "ddra",
            "ddrb",
            "ora",
            "orb",
            "ira",
            "irb",
            "t1",
            "t2",
            "t1_latch",
            "t2_latch_lo",
            "sr",
            "acr",
            "pcr",
            "ifr",
            "ier",
            "irq_pending",
            "ca1",
            "ca2",
            "ca2_out",
            "cb1",
            "cb2",
            "cb2_out",
            "pb7.toggle",
            "pb7.timer_out",
            "pipeline.delay",
            "pipeline.feed",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Unwired;
    use emu_core::{IrqLine, IrqSource};

    /// A VIA with every register moved away from its defaults.
    fn busy_via() -> Via6522 {
        let mut via = Via6522::new(IrqSource::Via2);
        let mut irq = IrqLine::new();
        via.poke(0x02, 0xF0, &mut Unwired, &mut irq);
        via.poke(0x03, 0x0F, &mut Unwired, &mut irq);
        via.poke(0x00, 0xA5, &mut Unwired, &mut irq);
        via.poke(0x01, 0x5A, &mut Unwired, &mut irq);
        via.poke(0x0B, 0xC1, &mut Unwired, &mut irq);
        via.poke(0x0C, 0xEE, &mut Unwired, &mut irq);
        via.poke(0x0A, 0x77, &mut Unwired, &mut irq);
        via.poke(0x0E, 0xC0, &mut Unwired, &mut irq);
        via.poke(0x04, 0x10, &mut Unwired, &mut irq);
        via.poke(0x05, 0x00, &mut Unwired, &mut irq);
        via.latch_input_a(0x42);
        via.latch_input_b(0x24);
        for _ in 0..0x13 {
            via.execute(&mut irq);
        }
        via
    }

    #[test]
    fn state_size_matches_layout() {
        let via = Via6522::new(IrqSource::Via1);
        assert_eq!(via.save_to_buffer().len(), 44);
        assert_eq!(STATE_SIZE, 44);
    }

    #[test]
    fn layout_order() {
        let via = busy_via();
        let data = via.save_to_buffer();
        assert_eq!(data[0], via.pa());
        assert_eq!(data[4], via.pb());
        assert_eq!(data[8], 0x0F); // ddra
        assert_eq!(data[9], 0xF0); // ddrb
        assert_eq!(data[12], 0x42); // ira
        assert_eq!(u16::from_le_bytes([data[14], data[15]]), via.t1());
        assert_eq!(data[18], 0x10); // t1_latch_lo
        assert_eq!(data[24], 0xC1); // acr
        assert_eq!(data[27], 0x77); // sr
    }

    #[test]
    fn save_then_load_restores_behaviour() {
        let original = busy_via();
        let data = original.save_to_buffer();

        let mut restored = Via6522::new(IrqSource::Via2);
        assert_eq!(restored.load_from_buffer(&data), Ok(STATE_SIZE));
        for path in original.query_paths() {
            assert_eq!(original.query(path), restored.query(path), "{path}");
        }

        // Both copies keep running in lockstep
        let mut a = original;
        let mut irq_a = IrqLine::new();
        let mut irq_b = IrqLine::new();
        for _ in 0..40 {
            a.execute(&mut irq_a);
            restored.execute(&mut irq_b);
        }
        assert_eq!(a.t1(), restored.t1());
        assert_eq!(a.ifr(), restored.ifr());
        assert_eq!(irq_a, irq_b);
    }

    #[test]
    fn truncated_state_is_an_error() {
        let data = busy_via().save_to_buffer();
        let mut via = Via6522::new(IrqSource::Via2);
        assert!(matches!(
            via.load_from_buffer(&data[..30]),
            Err(StateError::Truncated { .. })
        ));
    }

    #[test]
    fn reset_zeroes_every_item() {
        let mut via = busy_via();
        via.reset();
        let fresh = Via6522::new(IrqSource::Via2);
        assert_eq!(via.save_to_buffer(), fresh.save_to_buffer());
        assert_eq!(via.query("sr"), Some(Value::U8(0)));
        assert_eq!(via.query("ira"), Some(Value::U8(0)));
    }

    #[test]
    fn unknown_path() {
        let via = Via6522::new(IrqSource::Via1);
        assert_eq!(via.query("t3"), None);
    }
}

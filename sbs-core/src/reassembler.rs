//! The reassembly engine: raw feed bytes in, completed records out.
//!
//! One `Reassembler` per feed connection. It owns its splitter and aircraft
//! table outright, so independent feeds never share state.

use crate::emit::PlaneRecord;
use crate::extract::extract;
use crate::splitter::{LineSplitter, SplitMode};
use crate::table::{Accumulator, AircraftTable};

/// Minimum seconds between stale sweeps.
pub const SWEEP_INTERVAL: f64 = 10.0;

/// Snapshot of engine counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Lines that yielded fields (short lines are not counted).
    pub lines: u64,
    /// Accumulators currently in progress.
    pub tracked: usize,
    pub completed: u64,
    pub evicted: u64,
}

#[derive(Debug)]
pub struct Reassembler {
    splitter: LineSplitter,
    table: AircraftTable,
    lines: u64,
    last_sweep: Option<f64>,
}

impl Reassembler {
    pub fn new(mode: SplitMode, stale_timeout: Option<f64>) -> Self {
        Reassembler {
            splitter: LineSplitter::new(mode),
            table: AircraftTable::new(stale_timeout),
            lines: 0,
            last_sweep: None,
        }
    }

    /// Feed one raw chunk. Returns every record completed by it, in line order.
    pub fn push_chunk(&mut self, chunk: &[u8], now: f64) -> Vec<PlaneRecord> {
        let mut completed = Vec::new();
        for line in self.splitter.push(chunk) {
            if let Some(record) = self.push_line(&line, now) {
                completed.push(record);
            }
        }
        completed
    }

    /// Feed one already-split line.
    pub fn push_line(&mut self, line: &str, now: f64) -> Option<PlaneRecord> {
        let fields = extract(line)?;
        self.lines += 1;
        self.table.merge(&fields, now)
    }

    /// Drop any partial line held by the splitter. Accumulators survive.
    pub fn reset_stream(&mut self) {
        self.splitter.reset();
    }

    /// Expire stale accumulators, at most once per [`SWEEP_INTERVAL`].
    pub fn maybe_sweep(&mut self, now: f64) -> usize {
        if let Some(last) = self.last_sweep {
            if now - last < SWEEP_INTERVAL {
                return 0;
            }
        }
        self.last_sweep = Some(now);
        self.table.sweep(now)
    }

    pub fn accumulator(&self, mode_s: &str) -> Option<&Accumulator> {
        self.table.get(mode_s)
    }

    pub fn split_mode(&self) -> SplitMode {
        self.splitter.mode()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            lines: self.lines,
            tracked: self.table.len(),
            completed: self.table.completed,
            evicted: self.table.evicted,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sbs(mode_s: &str, callsign: &str, alt: &str, lat: &str, lon: &str, sqw: &str) -> String {
        format!(
            "MSG,3,1,1,{mode_s},1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,{callsign},{alt},,,{lat},{lon},{sqw},,0,0,0,0\r\n"
        )
    }

    #[test]
    fn test_single_complete_line() {
        let mut engine = Reassembler::new(SplitMode::Carry, None);
        let chunk = sbs("4840D6", "KLM1023", "37000", "51.5", "-0.12", "7000");
        let records = engine.push_chunk(chunk.as_bytes(), 1.0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].callsign, "KLM1023");
        assert_eq!(engine.stats().tracked, 0);
        assert_eq!(engine.stats().completed, 1);
    }

    #[test]
    fn test_short_lines_not_counted() {
        let mut engine = Reassembler::new(SplitMode::Carry, None);
        engine.push_chunk(b"MSG,8,1,1,4840D6,1\r\nSTA,,,\r\n", 1.0);
        assert_eq!(engine.stats(), EngineStats::default());
    }

    #[test]
    fn test_carry_mode_joins_chunks() {
        let mut engine = Reassembler::new(SplitMode::Carry, None);
        let line = sbs("4840D6", "KLM1023", "37000", "51.5", "-0.12", "7000");
        let (a, b) = line.as_bytes().split_at(30);

        assert!(engine.push_chunk(a, 1.0).is_empty());
        assert_eq!(engine.push_chunk(b, 1.1).len(), 1);
    }

    #[test]
    fn test_per_chunk_mode_loses_split_line() {
        let mut engine = Reassembler::new(SplitMode::PerChunk, None);
        let line = sbs("4840D6", "KLM1023", "37000", "51.5", "-0.12", "7000");
        let (a, b) = line.as_bytes().split_at(30);

        assert!(engine.push_chunk(a, 1.0).is_empty());
        assert!(engine.push_chunk(b, 1.1).is_empty());
        assert!(engine.accumulator("4840D6").is_none());
    }

    #[test]
    fn test_reset_stream_keeps_accumulators() {
        let mut engine = Reassembler::new(SplitMode::Carry, None);
        engine.push_chunk(sbs("A1", "CS", "", "", "", "").as_bytes(), 1.0);
        engine.push_chunk(b"MSG,3,1,1,A1", 1.0);
        engine.reset_stream();
        assert!(engine.accumulator("A1").is_some());
    }

    #[test]
    fn test_sweep_rate_limited() {
        let mut engine = Reassembler::new(SplitMode::Carry, Some(5.0));
        engine.push_chunk(sbs("A1", "CS", "", "", "", "").as_bytes(), 0.0);

        assert_eq!(engine.maybe_sweep(1.0), 0);
        // Stale by now, but the last sweep was under SWEEP_INTERVAL ago.
        assert_eq!(engine.maybe_sweep(8.0), 0);
        assert_eq!(engine.maybe_sweep(11.0), 1);
        assert_eq!(engine.stats().evicted, 1);
    }
}

//! Per-aircraft accumulators keyed by Mode-S address.
//!
//! Pure logic: no I/O. BaseStation spreads one aircraft's data over many
//! message types (identification, position, squawk, ...), so each field is
//! collected as it shows up. The first non-empty value for a field wins;
//! later values are ignored. Once all six fields are known the accumulator
//! is removed and handed back as a [`PlaneRecord`].
//!
//! Accumulators that never complete are expired by [`AircraftTable::sweep`]
//! after `stale_timeout` seconds of silence, if a timeout is set.

use std::collections::HashMap;

use crate::emit::PlaneRecord;
use crate::extract::ExtractedFields;

/// Default idle time before an incomplete accumulator is dropped.
pub const DEFAULT_STALE_TIMEOUT: f64 = 300.0;

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// In-progress record for one aircraft.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    pub mode_s: String,
    pub callsign: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub alt: Option<String>,
    pub sqw: Option<String>,

    pub first_seen: f64,
    pub last_seen: f64,
}

impl Accumulator {
    pub fn new(mode_s: &str, timestamp: f64) -> Self {
        Accumulator {
            mode_s: mode_s.to_string(),
            callsign: None,
            lat: None,
            lon: None,
            alt: None,
            sqw: None,
            first_seen: timestamp,
            last_seen: timestamp,
        }
    }

    /// Fill any still-empty slot from `fields`. Never overwrites.
    pub fn merge(&mut self, fields: &ExtractedFields<'_>, timestamp: f64) {
        fill(&mut self.callsign, fields.callsign);
        fill(&mut self.lat, fields.lat);
        fill(&mut self.lon, fields.lon);
        fill(&mut self.alt, fields.alt);
        fill(&mut self.sqw, fields.sqw);
        self.last_seen = timestamp;
    }

    pub fn is_complete(&self) -> bool {
        !self.mode_s.is_empty()
            && self.callsign.is_some()
            && self.lat.is_some()
            && self.lon.is_some()
            && self.alt.is_some()
            && self.sqw.is_some()
    }

    /// Number of the five mergeable fields still missing.
    pub fn missing(&self) -> usize {
        [&self.callsign, &self.lat, &self.lon, &self.alt, &self.sqw]
            .iter()
            .filter(|f| f.is_none())
            .count()
    }

    pub fn age(&self, now: f64) -> f64 {
        now - self.last_seen
    }

    /// Convert into a record. `None` while any field is still missing.
    pub fn into_record(self) -> Option<PlaneRecord> {
        if self.mode_s.is_empty() {
            return None;
        }
        Some(PlaneRecord {
            mode_s: self.mode_s,
            callsign: self.callsign?,
            lat: self.lat?,
            lon: self.lon?,
            alt: self.alt?,
            sqw: self.sqw?,
        })
    }
}

fn fill(slot: &mut Option<String>, incoming: Option<&str>) {
    if slot.is_some() {
        return;
    }
    if let Some(v) = incoming.filter(|v| !v.is_empty()) {
        *slot = Some(v.to_string());
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Mode-S → accumulator map. Owned by exactly one reassembly engine.
#[derive(Debug)]
pub struct AircraftTable {
    accumulators: HashMap<String, Accumulator>,
    stale_timeout: Option<f64>,

    // Counters
    pub completed: u64,
    pub evicted: u64,
}

impl AircraftTable {
    /// `stale_timeout` of `None` keeps incomplete accumulators forever.
    pub fn new(stale_timeout: Option<f64>) -> Self {
        AircraftTable {
            accumulators: HashMap::new(),
            stale_timeout,
            completed: 0,
            evicted: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.accumulators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accumulators.is_empty()
    }

    pub fn get(&self, mode_s: &str) -> Option<&Accumulator> {
        self.accumulators.get(mode_s)
    }

    /// Merge one extraction. Returns the finished record if this merge
    /// completed the aircraft; its accumulator is gone by then.
    pub fn merge(&mut self, fields: &ExtractedFields<'_>, now: f64) -> Option<PlaneRecord> {
        let mode_s = fields.mode_s.filter(|m| !m.is_empty())?;

        let acc = self
            .accumulators
            .entry(mode_s.to_string())
            .or_insert_with(|| Accumulator::new(mode_s, now));
        acc.merge(fields, now);

        if !acc.is_complete() {
            return None;
        }

        let record = self.accumulators.remove(mode_s)?.into_record()?;
        self.completed += 1;
        Some(record)
    }

    /// Drop accumulators idle longer than the stale timeout. Returns count removed.
    pub fn sweep(&mut self, now: f64) -> usize {
        let Some(timeout) = self.stale_timeout else {
            return 0;
        };
        let before = self.accumulators.len();
        self.accumulators.retain(|_, acc| acc.age(now) <= timeout);
        let removed = before - self.accumulators.len();
        self.evicted += removed as u64;
        removed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

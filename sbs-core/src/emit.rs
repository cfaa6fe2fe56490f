//! Completed aircraft records and their bus form.

use serde::Serialize;

use crate::error::Result;

/// Default topic prefix; topics look like `Planes/KLM1023`.
pub const DEFAULT_TOPIC_PREFIX: &str = "Planes";

/// A fully-populated aircraft record. Field order is the payload key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaneRecord {
    pub mode_s: String,
    pub callsign: String,
    pub lat: String,
    pub lon: String,
    pub alt: String,
    pub sqw: String,
}

/// A record ready for the publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Turns records into topic + JSON payload pairs.
#[derive(Debug, Clone)]
pub struct Emitter {
    prefix: String,
}

impl Default for Emitter {
    fn default() -> Self {
        Emitter::new(DEFAULT_TOPIC_PREFIX)
    }
}

impl Emitter {
    pub fn new(prefix: &str) -> Self {
        Emitter {
            prefix: prefix.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `prefix/callsign`, callsign taken verbatim (spaces included).
    pub fn topic(&self, record: &PlaneRecord) -> String {
        format!("{}/{}", self.prefix, record.callsign)
    }

    pub fn emit(&self, record: &PlaneRecord) -> Result<Emission> {
        Ok(Emission {
            topic: self.topic(record),
            payload: serde_json::to_vec(record)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! SBS-1 BaseStation line → the six fields we track.
//!
//! BaseStation lines are positional CSV:
//!
//! ```text
//! MSG,3,1,1,4840D6,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,37000,,,51.5,-0.12,,,0,0,0,0
//!  0  1 2 3   4    5     6          7             8          9       10  11   .. 14   15  16
//! ```
//!
//! Only offsets 4, 10, 11, 14, 15 and 16 matter here. Values are kept as the
//! raw text: altitude and coordinates are never parsed.

/// Minimum comma-separated field count for a usable line.
pub const MIN_FIELDS: usize = 17;

const IDX_MODE_S: usize = 4;
const IDX_CALLSIGN: usize = 10;
const IDX_ALT: usize = 11;
const IDX_LAT: usize = 14;
const IDX_LON: usize = 15;
const IDX_SQW: usize = 16;

/// Fields pulled from one line. `None` means the slot was empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractedFields<'a> {
    pub mode_s: Option<&'a str>,
    pub callsign: Option<&'a str>,
    pub lat: Option<&'a str>,
    pub lon: Option<&'a str>,
    pub alt: Option<&'a str>,
    pub sqw: Option<&'a str>,
}

/// Extract tracked fields from one line.
///
/// Lines with fewer than [`MIN_FIELDS`] fields return `None`. That is the
/// normal fate of noise and truncated fragments, not an error.
pub fn extract(line: &str) -> Option<ExtractedFields<'_>> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < MIN_FIELDS {
        return None;
    }

    Some(ExtractedFields {
        mode_s: non_empty(parts[IDX_MODE_S]),
        callsign: non_empty(parts[IDX_CALLSIGN]),
        lat: non_empty(parts[IDX_LAT]),
        lon: non_empty(parts[IDX_LON]),
        alt: non_empty(parts[IDX_ALT]),
        sqw: non_empty(parts[IDX_SQW]),
    })
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

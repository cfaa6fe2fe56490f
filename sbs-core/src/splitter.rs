//! Byte stream → candidate lines.
//!
//! The feed socket hands us arbitrary chunks: a chunk may hold several lines,
//! no terminator at all, or end halfway through a record. Two policies:
//!
//! - [`SplitMode::Carry`]: the unterminated tail is kept and prepended to the
//!   next chunk, so records split across reads are reassembled.
//! - [`SplitMode::PerChunk`]: every chunk stands alone. The trailing fragment
//!   is passed on as-is and nothing carries forward; truncated fragments
//!   normally fall below the field minimum and get dropped by the extractor.

/// Largest unterminated fragment kept between chunks. A feed that sends this
/// many bytes without a newline is not speaking SBS-1.
pub const MAX_PENDING: usize = 64 * 1024;

/// How unterminated chunk tails are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMode {
    #[default]
    Carry,
    PerChunk,
}

impl SplitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitMode::Carry => "carry",
            SplitMode::PerChunk => "per_chunk",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "carry" => Some(SplitMode::Carry),
            "per_chunk" => Some(SplitMode::PerChunk),
            _ => None,
        }
    }
}

/// Splits chunks on `\n`, strips a trailing `\r`, and drops empty lines.
#[derive(Debug, Default)]
pub struct LineSplitter {
    mode: SplitMode,
    pending: Vec<u8>,
    /// Set after an oversize fragment is dropped; cleared at the next `\n`.
    discarding: bool,
}

impl LineSplitter {
    pub fn new(mode: SplitMode) -> Self {
        LineSplitter {
            mode,
            pending: Vec::new(),
            discarding: false,
        }
    }

    pub fn mode(&self) -> SplitMode {
        self.mode
    }

    /// Bytes currently held back waiting for a terminator.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Forget any partial line (e.g. after the feed reconnects).
    pub fn reset(&mut self) {
        self.pending.clear();
        self.discarding = false;
    }

    /// Split one chunk into complete lines.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let (head, tail) = rest.split_at(pos);
            rest = &tail[1..];

            if self.discarding {
                self.discarding = false;
            } else if self.pending.is_empty() {
                push_line(&mut lines, head);
            } else {
                self.pending.extend_from_slice(head);
                let joined = std::mem::take(&mut self.pending);
                push_line(&mut lines, &joined);
            }
        }

        match self.mode {
            SplitMode::PerChunk => push_line(&mut lines, rest),
            // Still inside a dropped line.
            SplitMode::Carry if self.discarding => {}
            SplitMode::Carry => {
                if self.pending.len() + rest.len() > MAX_PENDING {
                    self.pending.clear();
                    self.discarding = true;
                } else {
                    self.pending.extend_from_slice(rest);
                }
            }
        }

        lines
    }
}

fn push_line(lines: &mut Vec<String>, raw: &[u8]) {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.is_empty() {
        return;
    }
    lines.push(String::from_utf8_lossy(raw).into_owned());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chunk() {
        let mut splitter = LineSplitter::new(SplitMode::Carry);
        assert!(splitter.push(b"").is_empty());
        assert_eq!(splitter.pending_len(), 0);
    }

    #[test]
    fn test_multiple_lines_one_chunk() {
        let mut splitter = LineSplitter::new(SplitMode::Carry);
        let lines = splitter.push(b"MSG,1\r\nMSG,2\r\n");
        assert_eq!(lines, vec!["MSG,1", "MSG,2"]);
    }

    #[test]
    fn test_blank_lines_dropped() {
        let mut splitter = LineSplitter::new(SplitMode::Carry);
        let lines = splitter.push(b"\n\r\nMSG,3\n\n");
        assert_eq!(lines, vec!["MSG,3"]);
    }

    #[test]
    fn test_carry_reassembles_split_line() {
        let mut splitter = LineSplitter::new(SplitMode::Carry);
        assert!(splitter.push(b"MSG,3,1,1,A1B").is_empty());
        assert_eq!(splitter.pending_len(), 13);

        let lines = splitter.push(b"2C3,1\r\nMSG,");
        assert_eq!(lines, vec!["MSG,3,1,1,A1B2C3,1"]);
        assert_eq!(splitter.pending_len(), 4);
    }

    #[test]
    fn test_carry_across_three_chunks() {
        let mut splitter = LineSplitter::new(SplitMode::Carry);
        assert!(splitter.push(b"AB").is_empty());
        assert!(splitter.push(b"CD").is_empty());
        assert_eq!(splitter.push(b"EF\n"), vec!["ABCDEF"]);
    }

    #[test]
    fn test_crlf_split_between_chunks() {
        let mut splitter = LineSplitter::new(SplitMode::Carry);
        assert!(splitter.push(b"MSG,8\r").is_empty());
        assert_eq!(splitter.push(b"\n"), vec!["MSG,8"]);
    }

    #[test]
    fn test_per_chunk_passes_fragments_through() {
        let mut splitter = LineSplitter::new(SplitMode::PerChunk);
        let first = splitter.push(b"MSG,1\nMSG,3,1,1,A1B");
        assert_eq!(first, vec!["MSG,1", "MSG,3,1,1,A1B"]);
        assert_eq!(splitter.pending_len(), 0);

        // The head of the next chunk is not joined to the previous tail.
        let second = splitter.push(b"2C3,1\n");
        assert_eq!(second, vec!["2C3,1"]);
    }

    #[test]
    fn test_pending_cap_discards_runaway_fragment() {
        let mut splitter = LineSplitter::new(SplitMode::Carry);
        let junk = vec![b'x'; MAX_PENDING];
        splitter.push(&junk);
        assert_eq!(splitter.pending_len(), MAX_PENDING);

        splitter.push(b"y");
        assert_eq!(splitter.pending_len(), 0);

        // The rest of the runaway line is dropped up to its newline.
        assert!(splitter.push(b"MSG,3,1,1,A1B2C3").is_empty());
        assert_eq!(splitter.pending_len(), 0);
        assert_eq!(splitter.push(b",tail\nMSG,4\n"), vec!["MSG,4"]);
    }

    #[test]
    fn test_reset_ends_discard() {
        let mut splitter = LineSplitter::new(SplitMode::Carry);
        splitter.push(&vec![b'x'; MAX_PENDING + 1]);
        splitter.reset();
        assert_eq!(splitter.push(b"MSG,5\n"), vec!["MSG,5"]);
    }

    #[test]
    fn test_reset_drops_pending() {
        let mut splitter = LineSplitter::new(SplitMode::Carry);
        splitter.push(b"half a li");
        splitter.reset();
        assert_eq!(splitter.push(b"ne\n"), vec!["ne"]);
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let mut splitter = LineSplitter::new(SplitMode::Carry);
        let lines = splitter.push(b"MSG,\xff\n");
        assert_eq!(lines, vec!["MSG,\u{FFFD}"]);
    }

    #[test]
    fn test_split_mode_parse() {
        assert_eq!(SplitMode::parse("carry"), Some(SplitMode::Carry));
        assert_eq!(SplitMode::parse("per_chunk"), Some(SplitMode::PerChunk));
        assert_eq!(SplitMode::parse("bogus"), None);
        assert_eq!(SplitMode::PerChunk.as_str(), "per_chunk");
    }
}

//! Offline replay: run a captured SBS-1 stream through the engine.
//!
//! Reads the file (or stdin for `-`) in feed-sized chunks so splitting
//! behaves as it would on the socket. No broker involved.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use comfy_table::{Cell, Table};
use tracing::info;

use sbs_core::{Emitter, PlaneRecord, Reassembler, SplitMode};

use crate::error::Result;
use crate::feed::READ_CHUNK;

/// Replay a capture from any reader. Returns completed records in order.
pub fn replay_reader<R: Read>(
    mut reader: R,
    mode: SplitMode,
) -> Result<(Vec<PlaneRecord>, Reassembler)> {
    let mut engine = Reassembler::new(mode, None);
    let mut records = Vec::new();
    let mut buf = [0u8; READ_CHUNK];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        records.extend(engine.push_chunk(&buf[..n], 0.0));
    }
    // A capture may end without a trailing newline.
    records.extend(engine.push_chunk(b"\n", 0.0));

    Ok((records, engine))
}

pub fn cmd_replay(file: &Path, json: bool, mode: SplitMode, emitter: &Emitter) -> Result<()> {
    let reader: Box<dyn Read> = if file.to_str() == Some("-") {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(file)?)
    };

    let (records, engine) = replay_reader(reader, mode)?;
    let stats = engine.stats();

    if json {
        for record in &records {
            println!("{}", serde_json::to_string(record).map_err(sbs_core::SbsError::from)?);
        }
        info!(
            lines = stats.lines,
            completed = stats.completed,
            incomplete = stats.tracked,
            "replay finished"
        );
        return Ok(());
    }

    println!();
    println!(
        "Lines: {} usable, {} aircraft complete, {} incomplete",
        stats.lines, stats.completed, stats.tracked
    );
    println!();

    if records.is_empty() {
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Mode-S", "Callsign", "Alt", "Lat", "Lon", "Squawk", "Topic",
    ]);
    for record in &records {
        table.add_row(vec![
            Cell::new(&record.mode_s),
            Cell::new(&record.callsign),
            Cell::new(&record.alt),
            Cell::new(&record.lat),
            Cell::new(&record.lon),
            Cell::new(&record.sqw),
            Cell::new(emitter.topic(record)),
        ]);
    }
    println!("{table}");

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

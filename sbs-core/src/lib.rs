//! sbs-core: Pure reassembly library for SBS-1 BaseStation feeds.
//!
//! No async, no I/O beyond the config file. Raw feed bytes go in and complete
//! per-aircraft records come out. The `sbs-bridge` binary supplies the
//! sockets and the MQTT client.

pub mod backoff;
pub mod config;
pub mod emit;
pub mod error;
pub mod extract;
pub mod outbox;
pub mod reassembler;
pub mod splitter;
pub mod table;

// Re-export commonly used types at crate root
pub use backoff::Backoff;
pub use emit::{Emission, Emitter, PlaneRecord};
pub use error::{Result, SbsError};
pub use extract::{extract, ExtractedFields};
pub use outbox::Outbox;
pub use reassembler::{EngineStats, Reassembler};
pub use splitter::{LineSplitter, SplitMode};
pub use table::{Accumulator, AircraftTable};

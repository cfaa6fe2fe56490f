//! Error enum shared by every sbs-core module.
//!
//! Malformed feed lines are not errors: the extractor skips them. What is
//! left is configuration, file I/O, and payload serialization.

use thiserror::Error;

/// All errors produced by sbs-core.
#[derive(Debug, Error)]
pub enum SbsError {
    #[error("config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SbsError>;

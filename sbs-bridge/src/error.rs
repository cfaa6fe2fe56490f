//! Error types for the bridge binary.

use thiserror::Error;

use sbs_core::SbsError;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Core(#[from] SbsError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("feed {addr}: gave up after {retries} reconnect attempts")]
    FeedRetriesExhausted { addr: String, retries: u32 },
    #[error("broker {addr}: gave up after {retries} reconnect attempts")]
    BrokerRetriesExhausted { addr: String, retries: u32 },
    #[error("publish failed: {0}")]
    Publish(String),
    #[error("cannot listen for Ctrl-C: {0}")]
    Signal(std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

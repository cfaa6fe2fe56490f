//! Upstream feed connection (dump1090 SBS-1 port).

use tokio::net::TcpStream;
use tracing::{error, info, warn};

use sbs_core::Backoff;

use crate::error::{BridgeError, Result};

/// Bytes requested per socket read.
pub const READ_CHUNK: usize = 1024;

/// Connects to the receiver, retrying with exponential backoff.
#[derive(Debug, Clone)]
pub struct FeedConnection {
    addr: String,
    backoff: Backoff,
}

impl FeedConnection {
    pub fn new(addr: String, backoff: Backoff) -> Self {
        FeedConnection { addr, backoff }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Open a connection. The retry counter starts at zero on every call, so
    /// only consecutive failures count toward the limit.
    pub async fn connect(&self) -> Result<TcpStream> {
        let mut retry = 0u32;
        loop {
            match TcpStream::connect(&self.addr).await {
                Ok(stream) => {
                    info!(feed = %self.addr, "connected to feed");
                    return Ok(stream);
                }
                Err(e) => {
                    let Some(delay) = self.backoff.delay(retry) else {
                        error!(feed = %self.addr, retries = retry, "feed unreachable, giving up");
                        return Err(BridgeError::FeedRetriesExhausted {
                            addr: self.addr.clone(),
                            retries: retry,
                        });
                    };
                    retry += 1;
                    warn!(
                        feed = %self.addr,
                        error = %e,
                        retry,
                        delay_ms = delay.as_millis() as u64,
                        "feed connect failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

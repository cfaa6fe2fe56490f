//! The main read → reassemble → publish loop.
//!
//! Runs on a single task: the engine's aircraft table is never shared, so it
//! needs no lock. A feed disconnect keeps the table (the same receiver will
//! be back) but drops any half-received line.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use sbs_core::config::BridgeConfig;
use sbs_core::{Emission, Emitter, Outbox, Reassembler};

use crate::error::Result;
use crate::feed::{FeedConnection, READ_CHUNK};
use crate::publish::Publisher;

/// How often engine counters are logged.
const STATS_INTERVAL: Duration = Duration::from_secs(60);

fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

pub struct Bridge<P> {
    feed: FeedConnection,
    engine: Reassembler,
    emitter: Emitter,
    outbox: Outbox,
    publisher: P,
    pacing: Duration,
    published: u64,
}

impl<P: Publisher> Bridge<P> {
    pub fn new(
        feed: FeedConnection,
        config: &BridgeConfig,
        emitter: Emitter,
        publisher: P,
    ) -> Self {
        Bridge {
            feed,
            engine: Reassembler::new(config.split_mode, config.stale_timeout),
            emitter,
            outbox: Outbox::new(config.outbox_capacity),
            publisher,
            pacing: config.pacing,
            published: 0,
        }
    }

    /// Run until the feed's reconnect budget is spent. Never returns `Ok`.
    pub async fn run(&mut self) -> Result<()> {
        let mut buf = vec![0u8; READ_CHUNK];
        let mut last_stats = Instant::now();

        info!(
            feed = %self.feed.addr(),
            topic_prefix = %self.emitter.prefix(),
            split_mode = self.engine.split_mode().as_str(),
            outbox_capacity = self.outbox.capacity(),
            "bridge starting"
        );

        loop {
            let mut stream = self.feed.connect().await?;
            self.engine.reset_stream();

            loop {
                let n = match stream.read(&mut buf).await {
                    Ok(0) => {
                        warn!(feed = %self.feed.addr(), "feed closed the connection");
                        break;
                    }
                    Ok(n) => n,
                    Err(e) => {
                        warn!(feed = %self.feed.addr(), error = %e, "feed read failed");
                        break;
                    }
                };

                self.process(&buf[..n], now()).await;

                if last_stats.elapsed() >= STATS_INTERVAL {
                    self.log_stats();
                    last_stats = Instant::now();
                }

                // Bounds the publish rate toward the broker.
                tokio::time::sleep(self.pacing).await;
            }

            drop(stream);
            tokio::time::sleep(self.feed.backoff().initial).await;
        }
    }

    /// Push one chunk through the engine and publish whatever completed.
    /// Returns the number of records completed by this chunk.
    pub async fn process(&mut self, chunk: &[u8], now: f64) -> usize {
        let records = self.engine.push_chunk(chunk, now);

        let evicted = self.engine.maybe_sweep(now);
        if evicted > 0 {
            debug!(evicted, "expired stale aircraft");
        }

        self.flush_outbox().await;

        for record in &records {
            match self.emitter.emit(record) {
                Ok(emission) => self.deliver(emission).await,
                Err(e) => warn!(mode_s = %record.mode_s, error = %e, "could not encode record"),
            }
        }
        records.len()
    }

    async fn deliver(&mut self, emission: Emission) {
        // Queued records go first so the bus sees completion order.
        if !self.outbox.is_empty() {
            self.enqueue(emission, "outbox backlog");
            return;
        }
        match self.publisher.publish(&emission).await {
            Ok(()) => {
                self.published += 1;
                debug!(topic = %emission.topic, "published");
            }
            Err(e) => self.enqueue(emission, &e.to_string()),
        }
    }

    fn enqueue(&mut self, emission: Emission, reason: &str) {
        if let Some(lost) = self.outbox.push(emission) {
            debug!(topic = %lost.topic, reason, "record dropped");
        }
    }

    async fn flush_outbox(&mut self) {
        while let Some(emission) = self.outbox.pop_front() {
            if self.publisher.publish(&emission).await.is_err() {
                self.outbox.push_front(emission);
                break;
            }
            self.published += 1;
            debug!(topic = %emission.topic, "published from outbox");
        }
    }

    pub fn log_stats(&self) {
        let stats = self.engine.stats();
        info!(
            lines = stats.lines,
            tracked = stats.tracked,
            completed = stats.completed,
            evicted = stats.evicted,
            published = self.published,
            queued = self.outbox.len(),
            dropped = self.outbox.dropped,
            "bridge stats"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

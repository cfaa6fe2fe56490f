//! MQTT side of the bridge.
//!
//! `MqttPublisher` hands emissions to the rumqttc request queue without
//! waiting. The connection itself lives in the event loop task started by
//! [`MqttPublisher::start`], which reconnects with its own backoff counter,
//! independent of the feed's.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use sbs_core::config::MqttConfig;
use sbs_core::{Backoff, Emission};

use crate::error::{BridgeError, Result};

/// Keep-alive sent to the broker.
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Pending requests rumqttc buffers before `try_publish` starts failing.
const REQUEST_CAPACITY: usize = 64;

/// Where completed records go.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, emission: &Emission) -> Result<()>;
}

pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    /// Build the client and spawn its event loop.
    ///
    /// The returned handle resolves only when the broker link gives up.
    pub fn start(config: &MqttConfig, backoff: Backoff) -> (Self, JoinHandle<BridgeError>) {
        let (client, eventloop) = AsyncClient::new(mqtt_options(config), REQUEST_CAPACITY);
        let addr = format!("{}:{}", config.host, config.port);
        let handle = tokio::spawn(drive_event_loop(eventloop, addr, backoff));
        (MqttPublisher { client }, handle)
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, emission: &Emission) -> Result<()> {
        self.client
            .try_publish(
                emission.topic.as_str(),
                QoS::AtMostOnce,
                false,
                emission.payload.clone(),
            )
            .map_err(|e| BridgeError::Publish(e.to_string()))
    }
}

fn mqtt_options(config: &MqttConfig) -> MqttOptions {
    let mut options = MqttOptions::new(
        config.client_id.as_str(),
        config.host.as_str(),
        config.port,
    );
    options.set_keep_alive(KEEP_ALIVE);
    if let Some(username) = &config.username {
        let password = config.password.clone().unwrap_or_default();
        options.set_credentials(username.as_str(), password);
    }
    options
}

/// Poll the rumqttc event loop forever, backing off between failed polls.
/// Each poll after an error is a reconnect attempt.
async fn drive_event_loop(mut eventloop: EventLoop, addr: String, backoff: Backoff) -> BridgeError {
    let mut retry = 0u32;
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                info!(broker = %addr, code = ?ack.code, "connected to MQTT broker");
                retry = 0;
            }
            Ok(_) => {}
            Err(e) => {
                let Some(delay) = backoff.delay(retry) else {
                    error!(broker = %addr, retries = retry, "MQTT broker unreachable, giving up");
                    return BridgeError::BrokerRetriesExhausted {
                        addr,
                        retries: retry,
                    };
                };
                retry += 1;
                warn!(
                    broker = %addr,
                    error = %e,
                    retry,
                    delay_ms = delay.as_millis() as u64,
                    "MQTT connection lost, reconnecting"
                );
                tokio::time::sleep(delay).await;
                debug!(broker = %addr, "retrying MQTT connection");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

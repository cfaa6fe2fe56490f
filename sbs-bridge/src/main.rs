//! sbs-bridge: dump1090 SBS-1 feed → MQTT.
//!
//! Subcommands:
//! - `run`:         bridge a live feed to the broker until interrupted
//! - `replay`:      reassemble records from a capture file, no network
//! - `init-config`: write a default config file

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use sbs_core::config::{self, parse_host_port, DEFAULT_CONFIG_FILE};
use sbs_core::{Emitter, SplitMode};

mod bridge;
mod error;
mod feed;
mod logging;
mod publish;
mod replay;

use bridge::Bridge;
use error::{BridgeError, Result};
use feed::FeedConnection;
use publish::MqttPublisher;

#[derive(Parser)]
#[command(
    name = "sbs-bridge",
    version,
    about = "Republish aircraft from a dump1090 SBS-1 feed to MQTT"
)]
struct Cli {
    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bridge a live SBS-1 feed to an MQTT broker
    Run {
        /// Config file (INI)
        #[arg(short, long, env = "SBS_BRIDGE_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Feed address, overrides [dump1090] (host:port)
        #[arg(long, env = "SBS_FEED")]
        feed: Option<String>,

        /// Broker address, overrides [mqtt] host/port (host:port)
        #[arg(long, env = "SBS_BROKER")]
        broker: Option<String>,
    },

    /// Reassemble records from a capture file ("-" for stdin)
    Replay {
        /// File containing raw SBS-1 lines
        file: PathBuf,

        /// Print one JSON payload per line instead of a table
        #[arg(long)]
        json: bool,

        /// Line splitting: carry | per_chunk
        #[arg(long, default_value = "carry", value_parser = parse_split_mode)]
        split_mode: SplitMode,

        /// Topic prefix shown in the table
        #[arg(long, default_value = sbs_core::emit::DEFAULT_TOPIC_PREFIX)]
        topic_prefix: String,
    },

    /// Write a config file with default values
    InitConfig {
        /// Destination path
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn parse_split_mode(s: &str) -> std::result::Result<SplitMode, String> {
    SplitMode::parse(s)
        .ok_or_else(|| format!("unknown split mode '{s}' (expected carry or per_chunk)"))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            feed,
            broker,
        } => cmd_run(&config, feed, broker).await,
        Commands::Replay {
            file,
            json,
            split_mode,
            topic_prefix,
        } => replay::cmd_replay(&file, json, split_mode, &Emitter::new(&topic_prefix)),
        Commands::InitConfig { path, force } => cmd_init_config(&path, force),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn cmd_run(config_path: &Path, feed: Option<String>, broker: Option<String>) -> Result<()> {
    if !config_path.exists() {
        warn!(path = %config_path.display(), "config file not found, using defaults");
    }
    let mut config = config::load_config(config_path)?;

    if let Some(feed) = feed {
        let (host, port) = parse_host_port(&feed)?;
        config.feed.host = host;
        config.feed.port = port;
    }
    if let Some(broker) = broker {
        let (host, port) = parse_host_port(&broker)?;
        config.mqtt.host = host;
        config.mqtt.port = port;
    }

    info!(
        feed = %config.feed.addr(),
        broker = %format!("{}:{}", config.mqtt.host, config.mqtt.port),
        "starting"
    );

    let (publisher, broker_task) = MqttPublisher::start(&config.mqtt, config.backoff);
    let feed = FeedConnection::new(config.feed.addr(), config.backoff);
    let mut bridge = Bridge::new(
        feed,
        &config.bridge,
        Emitter::new(&config.mqtt.topic_prefix),
        publisher,
    );

    let result = tokio::select! {
        res = bridge.run() => res,
        res = broker_task => match res {
            Ok(err) => Err(err),
            Err(join) => Err(BridgeError::Publish(format!("broker task ended: {join}"))),
        },
        res = tokio::signal::ctrl_c() => interrupted(res),
    };

    bridge.log_stats();
    result
}

/// Outcome of the Ctrl-C branch. A handler that could not be installed is
/// an error, not a clean shutdown.
fn interrupted(signal: std::io::Result<()>) -> Result<()> {
    match signal {
        Ok(()) => {
            info!("interrupted, closing feed connection");
            Ok(())
        }
        Err(e) => Err(BridgeError::Signal(e)),
    }
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(sbs_core::SbsError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ))
        .into());
    }
    config::save_config(&config::Config::default(), path)?;
    info!(path = %path.display(), "wrote default config");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

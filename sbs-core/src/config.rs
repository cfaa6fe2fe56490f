//! Configuration file management for the SBS bridge.
//!
//! Reads/writes an INI file (`config.ini` by default) with the receiver
//! feed address, MQTT broker settings, engine tuning, and reconnect backoff.

use std::path::Path;
use std::time::Duration;

use crate::backoff::Backoff;
use crate::emit::DEFAULT_TOPIC_PREFIX;
use crate::error::{Result, SbsError};
use crate::splitter::SplitMode;
use crate::table::DEFAULT_STALE_TIMEOUT;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.ini";

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub feed: FeedConfig,
    pub mqtt: MqttConfig,
    pub bridge: BridgeConfig,
    pub backoff: Backoff,
}

/// `[dump1090]`: where the SBS-1 feed is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub host: String,
    pub port: u16,
}

/// `[mqtt]`: broker connection and topic naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
    pub topic_prefix: String,
}

/// `[bridge]`: reassembly and pacing.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub pacing: Duration,
    /// Seconds of silence before an incomplete aircraft is dropped. `None` = never.
    pub stale_timeout: Option<f64>,
    pub split_mode: SplitMode,
    pub outbox_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            feed: FeedConfig {
                host: "127.0.0.1".into(),
                port: 30003,
            },
            mqtt: MqttConfig {
                host: "localhost".into(),
                port: 1883,
                username: None,
                password: None,
                client_id: "sbs-bridge".into(),
                topic_prefix: DEFAULT_TOPIC_PREFIX.into(),
            },
            bridge: BridgeConfig {
                pacing: Duration::from_millis(100),
                stale_timeout: Some(DEFAULT_STALE_TIMEOUT),
                split_mode: SplitMode::Carry,
                outbox_capacity: 0,
            },
            backoff: Backoff::default(),
        }
    }
}

impl FeedConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split `host:port` into its parts.
pub fn parse_host_port(s: &str) -> Result<(String, u16)> {
    let (host, port) = s
        .rsplit_once(':')
        .ok_or_else(|| SbsError::Config(format!("expected host:port, got '{s}'")))?;
    if host.is_empty() {
        return Err(SbsError::Config(format!("missing host in '{s}'")));
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| SbsError::Config(format!("invalid port in '{s}'")))?;
    Ok((host.to_string(), port))
}

/// Load config from `path`.
///
/// Returns default config if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)?;
    parse_config(&text)
}

/// Save config to `path`.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, render_config(config))?;
    Ok(())
}

/// Parse INI config text.
pub fn parse_config(text: &str) -> Result<Config> {
    let mut config = Config::default();
    let mut section = String::new();

    for (n, line) in text.lines().enumerate() {
        let stripped = line.trim();
        if stripped.is_empty() || is_comment(stripped) {
            continue;
        }

        if let Some(name) = stripped
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
        {
            section = name.trim().to_ascii_lowercase();
            continue;
        }

        // The first '=' or ':' separates key from value; the value is kept verbatim.
        let Some(pos) = stripped.find(|c| c == '=' || c == ':') else {
            return Err(SbsError::Config(format!(
                "line {}: expected key = value",
                n + 1
            )));
        };
        let key = stripped[..pos].trim().to_ascii_lowercase();
        let val = stripped[pos + 1..].trim();

        match (section.as_str(), key.as_str()) {
            ("dump1090", "host") => {
                if let Some(v) = parse_string_value(val) {
                    config.feed.host = v;
                }
            }
            ("dump1090", "port") => config.feed.port = parse_number(&section, &key, val)?,
            ("mqtt", "host") => {
                if let Some(v) = parse_string_value(val) {
                    config.mqtt.host = v;
                }
            }
            ("mqtt", "port") => config.mqtt.port = parse_number(&section, &key, val)?,
            ("mqtt", "username") => config.mqtt.username = parse_string_value(val),
            ("mqtt", "password") => config.mqtt.password = parse_string_value(val),
            ("mqtt", "client_id") => {
                if let Some(v) = parse_string_value(val) {
                    config.mqtt.client_id = v;
                }
            }
            ("mqtt", "topic_prefix") => {
                if let Some(v) = parse_string_value(val) {
                    config.mqtt.topic_prefix = v;
                }
            }
            ("bridge", "pacing_ms") => {
                config.bridge.pacing =
                    Duration::from_millis(parse_number(&section, &key, val)?)
            }
            ("bridge", "stale_timeout") => {
                let secs: f64 = parse_number(&section, &key, val)?;
                config.bridge.stale_timeout = (secs > 0.0).then_some(secs);
            }
            ("bridge", "split_mode") => {
                config.bridge.split_mode = SplitMode::parse(val).ok_or_else(|| {
                    SbsError::Config(format!("[bridge] split_mode: unknown mode '{val}'"))
                })?
            }
            ("bridge", "outbox_capacity") => {
                config.bridge.outbox_capacity = parse_number(&section, &key, val)?
            }
            ("backoff", "initial_ms") => {
                config.backoff.initial =
                    Duration::from_millis(parse_number(&section, &key, val)?)
            }
            ("backoff", "multiplier") => {
                config.backoff.multiplier = parse_number(&section, &key, val)?
            }
            ("backoff", "max_ms") => {
                config.backoff.max_delay =
                    Duration::from_millis(parse_number(&section, &key, val)?)
            }
            ("backoff", "max_retries") => {
                config.backoff.max_retries = parse_number(&section, &key, val)?
            }
            _ => {}
        }
    }

    config.backoff.validate()?;
    Ok(config)
}

/// Whole-line comments only. `#` or `;` later in a line belongs to the value.
fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with(';')
}

fn parse_string_value(val: &str) -> Option<String> {
    if val.is_empty() {
        return None;
    }
    // Strip quotes
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        let inner = &val[1..val.len() - 1];
        return (!inner.is_empty()).then(|| inner.to_string());
    }
    Some(val.to_string())
}

fn parse_number<T: std::str::FromStr>(section: &str, key: &str, val: &str) -> Result<T> {
    val.parse()
        .map_err(|_| SbsError::Config(format!("[{section}] {key}: invalid value '{val}'")))
}

/// Quote a string value when parsing would otherwise alter it.
fn render_string(val: &str) -> String {
    let needs_quotes = val.is_empty()
        || val.trim() != val
        || val.starts_with('"')
        || val.starts_with('\'');
    if needs_quotes {
        format!("\"{val}\"")
    } else {
        val.to_string()
    }
}

/// Serialize config to INI text.
pub fn render_config(config: &Config) -> String {
    let mut lines = vec!["# sbs-bridge configuration".to_string(), String::new()];

    lines.push("[dump1090]".into());
    lines.push(format!("host = {}", render_string(&config.feed.host)));
    lines.push(format!("port = {}", config.feed.port));
    lines.push(String::new());

    lines.push("[mqtt]".into());
    lines.push(format!("host = {}", render_string(&config.mqtt.host)));
    lines.push(format!("port = {}", config.mqtt.port));
    if let Some(user) = &config.mqtt.username {
        lines.push(format!("username = {}", render_string(user)));
    }
    if let Some(pass) = &config.mqtt.password {
        lines.push(format!("password = {}", render_string(pass)));
    }
    lines.push(format!(
        "client_id = {}",
        render_string(&config.mqtt.client_id)
    ));
    lines.push(format!(
        "topic_prefix = {}",
        render_string(&config.mqtt.topic_prefix)
    ));
    lines.push(String::new());

    lines.push("[bridge]".into());
    lines.push(format!("pacing_ms = {}", config.bridge.pacing.as_millis()));
    lines.push(format!(
        "stale_timeout = {}",
        config.bridge.stale_timeout.unwrap_or(0.0)
    ));
    lines.push(format!("split_mode = {}", config.bridge.split_mode.as_str()));
    lines.push(format!(
        "outbox_capacity = {}",
        config.bridge.outbox_capacity
    ));
    lines.push(String::new());

    lines.push("[backoff]".into());
    lines.push(format!("initial_ms = {}", config.backoff.initial.as_millis()));
    lines.push(format!("multiplier = {}", config.backoff.multiplier));
    lines.push(format!("max_ms = {}", config.backoff.max_delay.as_millis()));
    lines.push(format!("max_retries = {}", config.backoff.max_retries));

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.feed.addr(), "127.0.0.1:30003");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.topic_prefix, "Planes");
        assert!(config.mqtt.username.is_none());
        assert_eq!(config.bridge.pacing, Duration::from_millis(100));
        assert_eq!(config.bridge.outbox_capacity, 0);
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
[dump1090]
host = 192.168.1.20
port = 30003

[mqtt]
host = broker.local
port = 8883
username = "planes"
; broker credentials
password = s3cret
topic_prefix = adsb

[bridge]
pacing_ms = 250
stale_timeout = 120
split_mode = per_chunk
outbox_capacity = 32

[backoff]
initial_ms = 200
multiplier = 1.5
max_ms = 10000
max_retries = 5
"#;
        let config = parse_config(text).unwrap();
        assert_eq!(config.feed.host, "192.168.1.20");
        assert_eq!(config.mqtt.host, "broker.local");
        assert_eq!(config.mqtt.port, 8883);
        assert_eq!(config.mqtt.username.as_deref(), Some("planes"));
        assert_eq!(config.mqtt.password.as_deref(), Some("s3cret"));
        assert_eq!(config.mqtt.topic_prefix, "adsb");
        assert_eq!(config.bridge.pacing, Duration::from_millis(250));
        assert_eq!(config.bridge.stale_timeout, Some(120.0));
        assert_eq!(config.bridge.split_mode, SplitMode::PerChunk);
        assert_eq!(config.bridge.outbox_capacity, 32);
        assert_eq!(config.backoff.initial, Duration::from_millis(200));
        assert_eq!(config.backoff.multiplier, 1.5);
        assert_eq!(config.backoff.max_retries, 5);
    }

    #[test]
    fn test_original_layout_without_credentials() {
        let text = "[dump1090]\nhost = localhost\nport = 30003\n\n[mqtt]\nhost = 10.0.0.5\nport = 1883\n";
        let config = parse_config(text).unwrap();
        assert_eq!(config.feed.host, "localhost");
        assert_eq!(config.mqtt.host, "10.0.0.5");
        assert!(config.mqtt.username.is_none());
        assert!(config.mqtt.password.is_none());
    }

    #[test]
    fn test_stale_timeout_zero_disables() {
        let config = parse_config("[bridge]\nstale_timeout = 0\n").unwrap();
        assert!(config.bridge.stale_timeout.is_none());
    }

    #[test]
    fn test_invalid_port() {
        let err = parse_config("[mqtt]\nport = lots\n").unwrap_err();
        assert!(err.to_string().contains("[mqtt] port"));
    }

    #[test]
    fn test_invalid_split_mode() {
        assert!(parse_config("[bridge]\nsplit_mode = sometimes\n").is_err());
    }

    #[test]
    fn test_invalid_backoff_rejected() {
        assert!(parse_config("[backoff]\nmultiplier = 0.5\n").is_err());
    }

    #[test]
    fn test_missing_equals() {
        assert!(parse_config("[mqtt]\nhost broker\n").is_err());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = parse_config("[mqtt]\nqos = 2\n[extra]\nfoo = bar\n").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_comment_markers_inside_values() {
        let text = "[mqtt]\nusername = planes\npassword = #Secure1\nclient_id = bridge ;east\n";
        let config = parse_config(text).unwrap();
        assert_eq!(config.mqtt.password.as_deref(), Some("#Secure1"));
        assert_eq!(config.mqtt.client_id, "bridge ;east");
    }

    #[test]
    fn test_indented_comment_lines() {
        let config = parse_config("[mqtt]\n  # host = nowhere\n\t; port = 1\nport = 1884\n").unwrap();
        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.mqtt.port, 1884);
    }

    #[test]
    fn test_colon_delimiter() {
        let text = "[mqtt]\nhost: broker.local\nport: 8883\n[dump1090]\nhost = 10.0.0.2\n";
        let config = parse_config(text).unwrap();
        assert_eq!(config.mqtt.host, "broker.local");
        assert_eq!(config.mqtt.port, 8883);
        assert_eq!(config.feed.host, "10.0.0.2");
    }

    #[test]
    fn test_first_delimiter_wins() {
        let config = parse_config("[mqtt]\npassword = a:b=c\n").unwrap();
        assert_eq!(config.mqtt.password.as_deref(), Some("a:b=c"));
    }

    #[test]
    fn test_roundtrip_awkward_strings() {
        let mut config = Config::default();
        config.mqtt.username = Some(" spaced ".into());
        for pass in ["a ;b", "#Secure1", "x # y", "\"quoted\"", "'half", "k=v:w"] {
            config.mqtt.password = Some(pass.into());
            let parsed = parse_config(&render_config(&config)).unwrap();
            assert_eq!(parsed.mqtt.password.as_deref(), Some(pass));
            assert_eq!(parsed.mqtt.username.as_deref(), Some(" spaced "));
        }
    }

    #[test]
    fn test_roundtrip() {
        let mut config = Config::default();
        config.mqtt.username = Some("user".into());
        config.mqtt.password = Some("pass".into());
        config.bridge.stale_timeout = None;
        config.bridge.split_mode = SplitMode::PerChunk;
        config.backoff.multiplier = 1.5;

        let parsed = parse_config(&render_config(&config)).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_parse_host_port() {
        assert_eq!(
            parse_host_port("127.0.0.1:30003").unwrap(),
            ("127.0.0.1".to_string(), 30003)
        );
        assert!(parse_host_port("nohost").is_err());
        assert!(parse_host_port(":1883").is_err());
        assert!(parse_host_port("host:99999").is_err());
    }

    #[test]
    fn test_load_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.ini");
        let mut config = Config::default();
        config.feed.port = 40003;

        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }
}

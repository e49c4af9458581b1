//! Runner configuration.
//!
//! Settings come from an optional YAML file and the command line. Every file
//! field is optional; command-line flags win over the file, and built-in
//! defaults fill whatever neither sets.
//!
//! ```yaml
//! input_format: hex
//! output: log
//! log_filter: info
//! registry_summary: true
//! bus_name: apartment
//! stats_interval_secs: 60
//! bridge:
//!   address: 192.168.1.50:8899
//!   reconnect_delay_ms: 5000
//! rooms:
//!   1: Living room
//!   5: Kitchen
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::RunnerError;

/// Default bus name used in metric labels.
pub const DEFAULT_BUS_NAME: &str = "homebus";

/// Default delay before reconnecting to a TCP gateway.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;

/// How input bytes are encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Bytes exactly as read from the bus.
    #[default]
    Raw,
    /// Hex text, whitespace or comma separated, `#` starts a comment.
    Hex,
}

/// How events are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable log records on stderr.
    #[default]
    Log,
    /// One JSON object per event on stdout.
    Json,
}

/// TCP gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Gateway address, `HOST:PORT`.
    pub address: String,
    /// Delay before reconnecting; 0 disables reconnection.
    #[serde(default)]
    pub reconnect_delay_ms: Option<u64>,
}

/// Contents of the YAML configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    #[serde(default)]
    pub input_format: Option<InputFormat>,
    #[serde(default)]
    pub output: Option<OutputFormat>,
    #[serde(default)]
    pub log_filter: Option<String>,
    #[serde(default)]
    pub registry_summary: Option<bool>,
    #[serde(default)]
    pub bus_name: Option<String>,
    #[serde(default)]
    pub stats_interval_secs: Option<u64>,
    #[serde(default)]
    pub bridge: Option<BridgeConfig>,
    /// Room id to display name.
    #[serde(default)]
    pub rooms: BTreeMap<u8, String>,
}

impl RunnerConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text).map_err(|source| RunnerError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file is a valid, empty configuration.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }
}

/// Where bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
    Bridge {
        address: String,
        /// `None` disables reconnection.
        reconnect_delay: Option<Duration>,
    },
}

/// Effective settings after merging the command line over the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub input: InputSource,
    pub input_format: InputFormat,
    pub output: OutputFormat,
    /// Explicit log filter; `None` falls back to `RUST_LOG`, then `info`.
    pub log_filter: Option<String>,
    pub registry_summary: bool,
    pub bus_name: String,
    pub stats_interval: Option<Duration>,
    pub rooms: BTreeMap<u8, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            input: InputSource::Stdin,
            input_format: InputFormat::default(),
            output: OutputFormat::default(),
            log_filter: None,
            registry_summary: false,
            bus_name: DEFAULT_BUS_NAME.to_string(),
            stats_interval: None,
            rooms: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Merge command-line arguments over a loaded configuration.
    pub fn resolve(cli: &Cli, config: RunnerConfig) -> Self {
        // A file's bridge only applies when no input path was given.
        let config_bridge = config.bridge.as_ref().filter(|_| cli.input.is_none());
        let bridge_address = cli
            .connect
            .clone()
            .or_else(|| config_bridge.map(|b| b.address.clone()));

        let input = match bridge_address {
            Some(address) => {
                let delay_ms = cli
                    .reconnect_delay_ms
                    .or_else(|| config.bridge.as_ref().and_then(|b| b.reconnect_delay_ms))
                    .unwrap_or(DEFAULT_RECONNECT_DELAY_MS);
                InputSource::Bridge {
                    address,
                    reconnect_delay: (delay_ms > 0).then(|| Duration::from_millis(delay_ms)),
                }
            }
            None => match &cli.input {
                Some(path) if path.as_os_str() != "-" => InputSource::File(path.clone()),
                _ => InputSource::Stdin,
            },
        };

        let stats_secs = cli.stats_interval.or(config.stats_interval_secs);

        Settings {
            input,
            input_format: cli.format.or(config.input_format).unwrap_or_default(),
            output: cli.output.or(config.output).unwrap_or_default(),
            log_filter: cli.log_level.clone().or(config.log_filter),
            registry_summary: cli.registry_summary || config.registry_summary.unwrap_or(false),
            bus_name: cli
                .bus_name
                .clone()
                .or(config.bus_name)
                .unwrap_or_else(|| DEFAULT_BUS_NAME.to_string()),
            stats_interval: stats_secs
                .filter(|&secs| secs > 0)
                .map(Duration::from_secs),
            rooms: config.rooms,
        }
    }

    /// Load the configuration file named on the command line, if any, and
    /// merge the command line over it.
    pub fn from_cli(cli: &Cli) -> Result<Self, RunnerError> {
        let config = match &cli.config {
            Some(path) => RunnerConfig::load(path)?,
            None => RunnerConfig::default(),
        };
        Ok(Self::resolve(cli, config))
    }
}

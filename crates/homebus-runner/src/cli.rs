//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{InputFormat, OutputFormat};

/// Passive decoder for home-automation RS-485 bus traffic.
///
/// Reads a raw byte stream (or a hex capture) and reports the state of the
/// lights, outlets, heating and air conditioning it carries.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "homebus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Capture file or serial device to read. Reads stdin when absent or `-`.
    #[arg(conflicts_with = "connect")]
    pub input: Option<PathBuf>,

    /// YAML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log filter directive (e.g. `info`, `homebus_protocol=debug`).
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Input encoding.
    #[arg(short, long, value_enum)]
    pub format: Option<InputFormat>,

    /// Output style.
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Report the discovery registry when the input ends.
    #[arg(long)]
    pub registry_summary: bool,

    /// Read from an RS-485 to TCP gateway at HOST:PORT instead of a file.
    #[arg(long, value_name = "HOST:PORT")]
    pub connect: Option<String>,

    /// Delay before reconnecting to the gateway. 0 disables reconnection.
    #[arg(long, value_name = "MS")]
    pub reconnect_delay_ms: Option<u64>,

    /// Log throughput statistics every N seconds, including while a bridge is idle.
    #[arg(long, value_name = "SECS")]
    pub stats_interval: Option<u64>,

    /// Bus name attached to metrics.
    #[arg(long)]
    pub bus_name: Option<String>,

    /// Serve Prometheus metrics on this address.
    #[cfg(feature = "prometheus")]
    #[arg(long, value_name = "ADDR")]
    pub prometheus: Option<std::net::SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["homebus"]);
        assert!(cli.input.is_none());
        assert!(cli.format.is_none());
        assert!(!cli.registry_summary);
    }

    #[test]
    fn test_full_command_line() {
        let cli = Cli::parse_from([
            "homebus",
            "--config",
            "bus.yaml",
            "--format",
            "hex",
            "--output",
            "json",
            "--registry-summary",
            "-l",
            "debug",
            "capture.hex",
        ]);
        assert_eq!(cli.input, Some(PathBuf::from("capture.hex")));
        assert_eq!(cli.config, Some(PathBuf::from("bus.yaml")));
        assert_eq!(cli.format, Some(InputFormat::Hex));
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(cli.registry_summary);
    }

    #[test]
    fn test_connect_conflicts_with_input() {
        let result = Cli::try_parse_from(["homebus", "--connect", "10.0.0.5:8899", "capture.bin"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["homebus", "--format", "base64"]).is_err());
    }
}

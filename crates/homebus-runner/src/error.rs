//! Errors that stop the runner.
//!
//! Malformed bus traffic never ends up here; it is reported as diagnostics.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while running the decoder.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid hex capture at line {line}: {message}")]
    HexCapture { line: usize, message: String },

    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Metrics exporter error: {0}")]
    Metrics(String),
}

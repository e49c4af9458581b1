//! Tracing subscriber setup.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::error::RunnerError;

/// Filter used when neither an explicit directive nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "info";

/// Build the filter: explicit directive first, then `RUST_LOG`, then [`DEFAULT_FILTER`].
pub fn build_filter(directive: Option<&str>) -> Result<EnvFilter, RunnerError> {
    match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|e| RunnerError::Logging(format!("invalid filter {:?}: {}", directive, e))),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Install the global subscriber. Log records go to stderr so stdout stays
/// free for JSON output.
pub fn init_tracing(directive: Option<&str>) -> Result<(), RunnerError> {
    let filter = build_filter(directive)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init()
        .map_err(|e| RunnerError::Logging(e.to_string()))
}

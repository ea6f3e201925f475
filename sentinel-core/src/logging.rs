//! Structured logging initialization

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// Error returned when the tracing subscriber cannot be installed
#[derive(Debug, thiserror::Error)]
pub enum LoggingInitError {
    #[error("Invalid log filter directive: {0}")]
    InvalidFilter(String),

    #[error("Failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Initialize the global tracing subscriber from logging configuration.
///
/// The `RUST_LOG` environment variable takes precedence over the configured
/// level, matching the usual operator workflow.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), LoggingInitError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| LoggingInitError::InvalidFilter(e.to_string()))?;

    let builder = fmt().with_env_filter(filter).with_target(true);

    let result = match config.format.as_str() {
        "json" => builder.json().try_init(),
        "compact" => builder.compact().try_init(),
        _ => builder.pretty().try_init(),
    };

    result.map_err(|e| LoggingInitError::Install(e.to_string()))
}

//! Logging setup
//!
//! Installs the global `tracing` subscriber from [`LoggingConfig`]. `RUST_LOG`
//! wins over the configured level when it is set.

use crate::config::{LogFormat, LoggingConfig};
use crate::utils::error::{Result, ServiceError};
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ServiceError::config(format!("Invalid log level '{}': {}", config.level, e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_thread_ids(false);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };

    installed.map_err(|e| ServiceError::config(format!("Failed to install tracing subscriber: {}", e)))
}

/// Mask a session token for log output, keeping only a short prefix
pub fn redact_token(token: &str) -> String {
    if token.len() <= 6 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(4).collect();
    format!("{}***", prefix)
}

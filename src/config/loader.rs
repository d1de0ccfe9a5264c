//! Environment overrides
//!
//! Variables are read after `dotenvy` has loaded a `.env` file, if any.

use super::models::*;
use super::Config;
use crate::utils::error::{Result, ServiceError};
use std::env;
use tracing::debug;

pub const ENV_ERP_URL: &str = "BATCH_ERP_URL";
pub const ENV_ERP_TOKEN: &str = "BATCH_ERP_TOKEN";
pub const ENV_ERP_TIMEOUT: &str = "BATCH_ERP_TIMEOUT";
pub const ENV_LOG_LEVEL: &str = "BATCH_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "BATCH_LOG_FORMAT";

impl Config {
    /// Apply environment variable overrides on top of the current values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup, used by tests to avoid
    /// touching the process environment
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_ERP_URL) {
            debug!("ERP base_url overridden from {}", ENV_ERP_URL);
            self.erp.base_url = url;
        }
        if let Some(token) = lookup(ENV_ERP_TOKEN) {
            self.erp.token = Some(token);
        }
        if let Some(timeout) = lookup(ENV_ERP_TIMEOUT) {
            self.erp.timeout = timeout
                .parse()
                .map_err(|e| ServiceError::config(format!("Invalid {}: {}", ENV_ERP_TIMEOUT, e)))?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.logging.format = format
                .parse::<LogFormat>()
                .map_err(|e| ServiceError::config(format!("Invalid {}: {}", ENV_LOG_FORMAT, e)))?;
        }
        Ok(())
    }
}

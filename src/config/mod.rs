//! Configuration management for the orchestrator
//!
//! This module handles loading, validation, and management of all configuration.

mod loader;
pub mod models;
pub mod validation;

pub use loader::{ENV_ERP_TIMEOUT, ENV_ERP_TOKEN, ENV_ERP_URL, ENV_LOG_FORMAT, ENV_LOG_LEVEL};
pub use models::*;
pub use validation::Validate;

use crate::utils::error::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub erp: ErpConfig,
    #[serde(default)]
    pub batch: BatchSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,
}

impl Config {
    /// Load configuration from a YAML file, then apply environment overrides
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ServiceError::config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_yaml_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Parse configuration from YAML text without validation
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| ServiceError::config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from defaults plus environment variables
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.erp
            .validate()
            .map_err(|e| ServiceError::config(format!("ERP config error: {}", e)))?;

        self.batch
            .validate()
            .map_err(|e| ServiceError::config(format!("Batch config error: {}", e)))?;

        self.logging
            .validate()
            .map_err(|e| ServiceError::config(format!("Logging config error: {}", e)))?;

        for webhook in &self.webhooks {
            webhook
                .validate()
                .map_err(|e| ServiceError::config(format!("Webhook config error: {}", e)))?;
        }

        Ok(())
    }
}

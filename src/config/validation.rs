//! Configuration validation
//!
//! This module provides validation logic for all configuration structures.

use super::models::*;
use crate::core::batch::FeatureKind;
use tracing::debug;
use url::Url;

/// Validation trait for configuration structures
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

fn validate_http_url(url_str: &str, context: &str) -> Result<(), String> {
    let url = Url::parse(url_str).map_err(|e| format!("{} has invalid URL format: {}", context, e))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(format!(
                "{} must use http:// or https:// scheme, got: {}",
                context, scheme
            ));
        }
    }

    if url.host_str().is_none() {
        return Err(format!("{} URL must have a valid host", context));
    }

    Ok(())
}

impl Validate for ErpConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating ERP configuration");

        validate_http_url(&self.base_url, "ERP base_url")?;

        if self.timeout == 0 {
            return Err("ERP timeout must be greater than 0".to_string());
        }

        if let Some(token) = &self.token {
            if token.trim().is_empty() {
                return Err("ERP token cannot be blank when set".to_string());
            }
        }

        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.level.trim().is_empty() {
            return Err("Log level cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Validate for WebhookConfig {
    fn validate(&self) -> Result<(), String> {
        validate_http_url(&self.url, "Webhook url")
    }
}

impl Validate for BatchSettings {
    fn validate(&self) -> Result<(), String> {
        if self.event_capacity == 0 {
            return Err("event_capacity must be greater than 0".to_string());
        }

        for kind in FeatureKind::ALL {
            if let Some(size) = self.overrides(kind).chunk_size {
                let (min, max) = kind.chunk_bounds();
                if size < min || size > max {
                    return Err(format!(
                        "{} chunk_size must be between {} and {}, got {}",
                        kind, min, max, size
                    ));
                }
            }
        }

        Ok(())
    }
}

//! Webhook forwarding configuration

use super::*;
use crate::core::batch::BatchEventKind;
use serde::{Deserialize, Serialize};

/// A subscriber URL receiving batch events as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    /// Event kinds to forward; empty means all of them
    #[serde(default)]
    pub events: Vec<BatchEventKind>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Extra headers sent with each delivery
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,
}

impl WebhookConfig {
    /// Whether this webhook wants events of the given kind
    pub fn accepts(&self, kind: BatchEventKind) -> bool {
        self.enabled && (self.events.is_empty() || self.events.contains(&kind))
    }
}

//! ERP bridge configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Connection settings for the ERP RPC bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErpConfig {
    /// Base URL; RPC methods are appended as path segments
    #[serde(default = "default_erp_url")]
    pub base_url: String,
    /// Session token forwarded with every call
    #[serde(default)]
    pub token: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Poll `getQueueStatus` between chunks in addition to local cancellation
    #[serde(default = "default_true")]
    pub poll_queue_status: bool,
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            base_url: default_erp_url(),
            token: None,
            timeout: default_timeout(),
            poll_queue_status: true,
        }
    }
}

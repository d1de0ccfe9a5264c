//! Webhook payload and statistics types

use crate::core::batch::BatchEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Body posted to a webhook: the event plus delivery metadata
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    /// Unique per delivery, lets receivers drop duplicates
    pub delivery_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: BatchEvent,
}

/// Delivery counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookStats {
    pub delivered: u64,
    pub failed: u64,
    /// Events skipped because the forwarder fell behind the bus
    pub lagged: u64,
}

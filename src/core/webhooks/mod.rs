//! Webhook forwarding of batch events
//!
//! Subscribes to the batch event bus and posts each event to the configured
//! URLs. Delivery is fire-and-forget; failures are logged and counted.

mod delivery;
mod manager;
mod types;

pub use manager::WebhookForwarder;
pub use types::{WebhookPayload, WebhookStats};

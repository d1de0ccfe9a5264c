//! Webhook forwarder implementation

use super::types::WebhookStats;
use crate::config::WebhookConfig;
use crate::core::batch::BatchEvent;
use crate::utils::error::{Result, ServiceError};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Forwards batch events to webhook subscribers
#[derive(Clone)]
pub struct WebhookForwarder {
    /// HTTP client for webhook requests
    pub(super) client: Client,
    pub(super) webhooks: Arc<Vec<WebhookConfig>>,
    pub(super) stats: Arc<RwLock<WebhookStats>>,
}

impl WebhookForwarder {
    /// Create a new forwarder
    pub fn new(webhooks: Vec<WebhookConfig>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ServiceError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            webhooks: Arc::new(webhooks),
            stats: Arc::new(RwLock::new(WebhookStats::default())),
        })
    }

    pub fn is_empty(&self) -> bool {
        !self.webhooks.iter().any(|w| w.enabled)
    }

    pub async fn stats(&self) -> WebhookStats {
        self.stats.read().await.clone()
    }

    /// Forward events from `receiver` until the bus closes
    pub fn start(self, mut receiver: broadcast::Receiver<BatchEvent>) -> JoinHandle<()> {
        info!(
            "Started webhook forwarder for {} webhooks",
            self.webhooks.len()
        );

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        self.deliver(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Webhook forwarder lagged, skipped {} events", skipped);
                        self.stats.write().await.lagged += skipped;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Event bus closed, stopping webhook forwarder");
                        break;
                    }
                }
            }
        })
    }
}

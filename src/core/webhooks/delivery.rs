//! Webhook delivery

use super::manager::WebhookForwarder;
use super::types::WebhookPayload;
use crate::config::WebhookConfig;
use crate::core::batch::BatchEvent;
use crate::utils::error::{Result, ServiceError};
use tracing::{debug, error};
use uuid::Uuid;

impl WebhookForwarder {
    /// Post `event` to every webhook that accepts it; returns the number of
    /// successful deliveries
    pub async fn deliver(&self, event: &BatchEvent) -> usize {
        let kind = event.kind();
        let mut delivered = 0;

        for config in self.webhooks.iter().filter(|w| w.accepts(kind)) {
            let payload = WebhookPayload {
                delivery_id: Uuid::new_v4().to_string(),
                timestamp: chrono::Utc::now(),
                event: event.clone(),
            };

            match self.deliver_to(config, &payload).await {
                Ok(()) => {
                    delivered += 1;
                    self.stats.write().await.delivered += 1;
                }
                Err(e) => {
                    error!("Webhook delivery to {} failed: {}", config.url, e);
                    self.stats.write().await.failed += 1;
                }
            }
        }

        delivered
    }

    async fn deliver_to(&self, config: &WebhookConfig, payload: &WebhookPayload) -> Result<()> {
        let mut request = self
            .client
            .post(&config.url)
            .header("X-Batch-Event", payload.event.kind().as_str());

        for (key, value) in &config.headers {
            request = request.header(key, value);
        }

        let response = request
            .json(payload)
            .send()
            .await
            .map_err(|e| ServiceError::network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(
                "Webhook delivered: {} -> {}",
                payload.event.kind(),
                config.url
            );
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ServiceError::network(format!(
                "Webhook returned status {}: {}",
                status.as_u16(),
                body
            )))
        }
    }
}

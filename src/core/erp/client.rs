//! HTTP client for the ERP RPC bridge
//!
//! Every method is a JSON `POST {base_url}/{method}`. The session token comes
//! from the caller's [`SessionContext`], never from process state.

use super::types::{BatchRequest, ChunkRequest, QueueStatus, RpcResponse};
use crate::config::ErpConfig;
use crate::core::batch::{Chunk, FeatureKind, WorkItem};
use crate::core::session::SessionContext;
use crate::utils::error::{Result, ServiceError};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

const STATUS_METHOD: &str = "getQueueStatus";
const CANCEL_METHOD: &str = "cancelQueue";

/// ERP bridge client
#[derive(Debug, Clone)]
pub struct ErpClient {
    client: Client,
    base_url: Url,
}

impl ErpClient {
    /// Create a new client
    pub fn new(config: &ErpConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| ServiceError::config(format!("Invalid ERP base_url: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(concat!("replenish-batch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, method: &str) -> Result<Url> {
        let url = format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), method);
        Url::parse(&url).map_err(|e| ServiceError::config(format!("Invalid ERP method URL: {}", e)))
    }

    /// POST `body` to `method` and decode the JSON reply
    pub async fn call<B, R>(&self, ctx: &SessionContext, method: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(method)?;
        let start = Instant::now();

        let mut request = self
            .client
            .post(url)
            .header("X-Request-Id", &ctx.request_id)
            .json(body);
        if let Some(token) = &ctx.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| send_error(method, e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| send_error(method, e))?;
        debug!(
            "ERP {} answered {} in {}ms",
            method,
            status,
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            warn!("ERP {} failed with status {}", method, status);
            return Err(ServiceError::erp(format!(
                "{} returned HTTP {}: {}",
                method,
                status.as_u16(),
                text.trim()
            )));
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Apply one chunk with the feature's chunk method
    pub async fn process_chunk(
        &self,
        ctx: &SessionContext,
        feature: FeatureKind,
        batch_id: &str,
        chunk: &Chunk<WorkItem>,
        branch: Option<&str>,
        params: &Map<String, Value>,
    ) -> Result<RpcResponse> {
        let body = ChunkRequest {
            batch_id,
            chunk_number: chunk.sequence,
            total_chunks: chunk.total,
            is_last_chunk: chunk.is_last(),
            items: &chunk.items,
            branch,
            action: feature.queue_action(),
            params,
        };
        self.call(ctx, feature.chunk_method(), &body).await
    }

    /// Clear previous results with `method`; a `success: false` reply is an error
    pub async fn reset(
        &self,
        ctx: &SessionContext,
        method: &str,
        batch_id: &str,
        branch: Option<&str>,
        params: &Map<String, Value>,
    ) -> Result<()> {
        let body = BatchRequest {
            batch_id,
            branch,
            params,
        };
        let response: RpcResponse = self.call(ctx, method, &body).await?;
        ensure_success(method, &response)
    }

    pub async fn get_queue_status(
        &self,
        ctx: &SessionContext,
        batch_id: &str,
    ) -> Result<QueueStatus> {
        let params = Map::new();
        let body = BatchRequest {
            batch_id,
            branch: None,
            params: &params,
        };
        let status: QueueStatus = self.call(ctx, STATUS_METHOD, &body).await?;
        if !status.success {
            return Err(ServiceError::erp(format!(
                "{} failed: {}",
                STATUS_METHOD,
                status.error.as_deref().unwrap_or("no reason given")
            )));
        }
        Ok(status)
    }

    /// Flip the stored queue status to cancelled; the running job stops at
    /// its next chunk boundary
    pub async fn cancel_queue(&self, ctx: &SessionContext, batch_id: &str) -> Result<RpcResponse> {
        let params = Map::new();
        let body = BatchRequest {
            batch_id,
            branch: None,
            params: &params,
        };
        let response: RpcResponse = self.call(ctx, CANCEL_METHOD, &body).await?;
        ensure_success(CANCEL_METHOD, &response)?;
        Ok(response)
    }
}

fn ensure_success(method: &str, response: &RpcResponse) -> Result<()> {
    if response.success {
        Ok(())
    } else {
        Err(ServiceError::erp(format!(
            "{} failed: {}",
            method,
            response.reason().unwrap_or("no reason given")
        )))
    }
}

fn send_error(method: &str, error: reqwest::Error) -> ServiceError {
    if error.is_timeout() {
        ServiceError::timeout(format!("{} timed out", method))
    } else if error.is_connect() {
        ServiceError::network(format!("{}: {}", method, error))
    } else {
        ServiceError::HttpClient(error)
    }
}

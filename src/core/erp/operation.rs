//! Chunk operation and cancellation gate backed by the ERP

use super::client::ErpClient;
use crate::core::batch::{
    CancellationGate, Chunk, ChunkAck, ChunkOperation, FeatureKind, JobSpec, WorkItem,
};
use crate::core::session::SessionContext;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

/// Applies each chunk with the feature's ERP method
#[derive(Debug, Clone)]
pub struct ErpChunkOperation {
    client: ErpClient,
    feature: FeatureKind,
    branch: Option<String>,
    params: Map<String, Value>,
}

impl ErpChunkOperation {
    pub fn new(client: ErpClient, spec: &JobSpec) -> Self {
        Self {
            client,
            feature: spec.feature,
            branch: spec.branch.clone(),
            params: spec.params.clone(),
        }
    }
}

#[async_trait]
impl ChunkOperation for ErpChunkOperation {
    async fn reset(&self, ctx: &SessionContext, batch_id: &str) -> Result<()> {
        match self.feature.reset_method() {
            Some(method) => {
                debug!("Resetting {} via {}", self.feature, method);
                self.client
                    .reset(ctx, method, batch_id, self.branch.as_deref(), &self.params)
                    .await
            }
            None => Ok(()),
        }
    }

    async fn process_chunk(
        &self,
        ctx: &SessionContext,
        batch_id: &str,
        chunk: &Chunk<WorkItem>,
    ) -> Result<ChunkAck> {
        let response = self
            .client
            .process_chunk(
                ctx,
                self.feature,
                batch_id,
                chunk,
                self.branch.as_deref(),
                &self.params,
            )
            .await?;
        Ok(response.into_ack())
    }
}

/// Polls `getQueueStatus` and reports a batch as cancelled once the stored
/// status says so
#[derive(Debug, Clone)]
pub struct QueueStatusGate {
    client: ErpClient,
    ctx: SessionContext,
}

impl QueueStatusGate {
    pub fn new(client: ErpClient, ctx: SessionContext) -> Self {
        Self { client, ctx }
    }
}

#[async_trait]
impl CancellationGate for QueueStatusGate {
    async fn is_cancelled(&self, batch_id: &str) -> Result<bool> {
        let status = self.client.get_queue_status(&self.ctx, batch_id).await?;
        Ok(status.is_cancelled())
    }
}

//! Downstream operation applied to each chunk

use super::types::{Chunk, WorkItem};
use crate::core::session::SessionContext;
use crate::utils::error::{Result, ServiceError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Acknowledgement returned by the downstream system for one chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkAck {
    pub success: bool,
    /// Rows the downstream reports as applied, when it says
    #[serde(default)]
    pub processed_count: Option<usize>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ChunkAck {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            processed_count: None,
            message: Some(message.into()),
        }
    }

    /// Treat `success: false` the same as a transport error
    pub fn into_result(self) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(ServiceError::erp(
                self.message
                    .unwrap_or_else(|| "downstream reported failure".to_string()),
            ))
        }
    }
}

/// One call per chunk against the downstream system.
///
/// Implementations must not assume concurrency: the runner awaits each call
/// before issuing the next.
#[async_trait]
pub trait ChunkOperation: Send + Sync {
    /// Clear previous results before the first chunk. Only called when the
    /// runner policy asks for a reset stage.
    async fn reset(&self, _ctx: &SessionContext, _batch_id: &str) -> Result<()> {
        Ok(())
    }

    async fn process_chunk(
        &self,
        ctx: &SessionContext,
        batch_id: &str,
        chunk: &Chunk<WorkItem>,
    ) -> Result<ChunkAck>;
}

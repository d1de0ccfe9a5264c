//! Wire types of the ERP RPC bridge

use crate::core::batch::{ChunkAck, WorkItem};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Generic `{ success, processedCount?, error?, message? }` reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(
        default,
        rename = "processedCount",
        skip_serializing_if = "Option::is_none"
    )]
    pub processed_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RpcResponse {
    /// Best human-readable explanation the ERP gave
    pub fn reason(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }

    pub fn into_ack(self) -> ChunkAck {
        let message = self.error.or(self.message);
        ChunkAck {
            success: self.success,
            processed_count: self.processed_count,
            message,
        }
    }
}

/// Reply of `getQueueStatus`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    #[serde(default)]
    pub success: bool,
    /// `processing`, `cancelled`, `completed`...
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueueStatus {
    pub fn is_cancelled(&self) -> bool {
        self.status.eq_ignore_ascii_case("cancelled")
    }
}

/// Body sent with every per-chunk call
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRequest<'a> {
    pub batch_id: &'a str,
    pub chunk_number: usize,
    pub total_chunks: usize,
    pub is_last_chunk: bool,
    pub items: &'a [WorkItem],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
    #[serde(flatten)]
    pub params: &'a Map<String, Value>,
}

/// Body of the calls that address a whole batch: reset, status, cancel
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest<'a> {
    pub batch_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<&'a str>,
    #[serde(flatten)]
    pub params: &'a Map<String, Value>,
}

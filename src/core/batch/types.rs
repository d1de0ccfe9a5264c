//! Batch job types and data structures

use super::features::FeatureKind;
use crate::utils::error::{Result, ServiceError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared, observable handle to a running job
pub type JobHandle = Arc<RwLock<BatchJob>>;

/// Batch job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, no chunk started yet
    Pending,
    /// Chunks are being applied
    Processing,
    /// Stopped at a chunk boundary on request
    Cancelled,
    /// Every chunk was attempted
    Completed,
    /// Aborted on a failed chunk or reset
    Failed,
}

impl JobStatus {
    /// Terminal jobs never change status again
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed | Self::Failed)
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Cancelled)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Cancelled)
                | (Self::Processing, Self::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a single unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemOutcome {
    Pending,
    Processing,
    Success,
    Error,
    Cancelled,
}

impl ItemOutcome {
    fn is_settled(self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Cancelled)
    }
}

/// A single unit of work: a material code or a detail row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Material code or row key
    pub code: String,
    /// Opaque fields forwarded to the ERP untouched
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl WorkItem {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(code: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            code: code.into(),
            payload,
        }
    }
}

/// Per-item bookkeeping inside a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub code: String,
    pub outcome: ItemOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// An ordered slice of the item list processed as one downstream call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk<T = WorkItem> {
    /// 1-based position in the split
    pub sequence: usize,
    /// Number of chunks in the split
    pub total: usize,
    /// Index of the first item in the original list
    pub offset: usize,
    pub items: Vec<T>,
}

impl<T> Chunk<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Range of this chunk's items in the original list
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.items.len()
    }

    pub fn is_last(&self) -> bool {
        self.sequence == self.total
    }
}

/// Stage label carried by progress snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStage {
    Reset,
    Chunks,
    Complete,
}

/// Point-in-time progress of a job, pushed to observers after every chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub batch_id: String,
    pub stage: ProgressStage,
    pub current: usize,
    pub total: usize,
    pub percent: u8,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<u64>,
}

/// One end-to-end run of the chunked orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    /// Opaque token unique per run
    pub id: String,
    pub user_id: String,
    pub feature: FeatureKind,
    pub total_items: usize,
    pub chunk_size: usize,
    pub total_chunks: usize,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Items applied successfully
    pub processed_count: usize,
    /// Items whose chunk failed
    pub failed_count: usize,
    /// Chunks whose downstream call resolved, either way
    pub chunks_attempted: usize,
    /// 1-based index of the chunk that aborted the run
    pub failed_chunk: Option<usize>,
    pub error: Option<String>,
    pub items: Vec<ItemRecord>,
}

impl BatchJob {
    /// Create a pending job for the given items
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        feature: FeatureKind,
        items: &[WorkItem],
        chunk_size: usize,
    ) -> Self {
        let records = items
            .iter()
            .map(|item| ItemRecord {
                code: item.code.clone(),
                outcome: ItemOutcome::Pending,
                message: None,
                duration_ms: None,
            })
            .collect();

        Self {
            id: id.into(),
            user_id: user_id.into(),
            feature,
            total_items: items.len(),
            chunk_size,
            total_chunks: super::splitter::chunk_count(items.len(), chunk_size),
            status: JobStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            processed_count: 0,
            failed_count: 0,
            chunks_attempted: 0,
            failed_chunk: None,
            error: None,
            items: records,
        }
    }

    /// Move to `next`, stamping the matching timestamp
    pub fn transition(&mut self, next: JobStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(ServiceError::invalid_state(format!(
                "batch {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }

        let now = Utc::now();
        match next {
            JobStatus::Processing => self.started_at = Some(now),
            JobStatus::Cancelled | JobStatus::Completed | JobStatus::Failed => {
                self.completed_at = Some(now)
            }
            JobStatus::Pending => {}
        }
        self.status = next;
        Ok(())
    }

    /// Set the outcome of the items in `range` that have not settled yet
    pub fn mark_items(
        &mut self,
        range: Range<usize>,
        outcome: ItemOutcome,
        message: Option<&str>,
        duration_ms: Option<u64>,
    ) {
        let end = range.end.min(self.items.len());
        let start = range.start.min(end);
        for record in &mut self.items[start..end] {
            if record.outcome.is_settled() {
                continue;
            }
            record.outcome = outcome;
            record.message = message.map(str::to_string);
            record.duration_ms = duration_ms;
        }
    }

    /// Items not yet applied or failed
    pub fn unattempted_count(&self) -> usize {
        self.items
            .iter()
            .filter(|r| {
                matches!(
                    r.outcome,
                    ItemOutcome::Pending | ItemOutcome::Processing | ItemOutcome::Cancelled
                )
            })
            .count()
    }

    /// processed + failed + unattempted always equals the item total
    pub fn counts_consistent(&self) -> bool {
        self.processed_count + self.failed_count + self.unattempted_count() == self.total_items
    }

    pub fn percent(&self) -> u8 {
        super::progress::percent(self.processed_count + self.failed_count, self.total_items)
    }
}

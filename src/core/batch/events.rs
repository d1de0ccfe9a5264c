//! Batch events and the broadcast bus carrying them
//!
//! Events are produced by a single sequential runner per job, so subscribers
//! see them in order. A lagging subscriber skips ahead and simply sees the
//! next snapshot.

use super::types::ProgressSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tracing::trace;

/// Event published by the chunk runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum BatchEvent {
    #[serde(rename = "batch-progress")]
    Progress(ProgressSnapshot),

    #[serde(rename = "batch-completed")]
    Completed {
        batch_id: String,
        total: usize,
        processed_count: usize,
        failed_count: usize,
    },

    #[serde(rename = "batch-cancelled")]
    Cancelled {
        batch_id: String,
        total: usize,
        processed_count: usize,
    },

    #[serde(rename = "batch-failed")]
    Failed {
        batch_id: String,
        /// 1-based chunk index; `None` when the reset stage failed
        chunk_number: Option<usize>,
        processed_count: usize,
        error: String,
    },
}

impl BatchEvent {
    pub fn kind(&self) -> BatchEventKind {
        match self {
            Self::Progress(_) => BatchEventKind::Progress,
            Self::Completed { .. } => BatchEventKind::Completed,
            Self::Cancelled { .. } => BatchEventKind::Cancelled,
            Self::Failed { .. } => BatchEventKind::Failed,
        }
    }

    pub fn batch_id(&self) -> &str {
        match self {
            Self::Progress(snapshot) => &snapshot.batch_id,
            Self::Completed { batch_id, .. }
            | Self::Cancelled { batch_id, .. }
            | Self::Failed { batch_id, .. } => batch_id,
        }
    }

    /// Terminal events close a job's stream
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

/// Event name, used for subscription filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchEventKind {
    #[serde(rename = "batch-progress")]
    Progress,
    #[serde(rename = "batch-completed")]
    Completed,
    #[serde(rename = "batch-cancelled")]
    Cancelled,
    #[serde(rename = "batch-failed")]
    Failed,
}

impl BatchEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Progress => "batch-progress",
            Self::Completed => "batch-completed",
            Self::Cancelled => "batch-cancelled",
            Self::Failed => "batch-failed",
        }
    }
}

impl fmt::Display for BatchEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fan-out channel for batch events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BatchEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event; having no subscribers is not an error
    pub fn publish(&self, event: BatchEvent) {
        trace!(event = %event.kind(), batch_id = event.batch_id(), "publishing batch event");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::config::default_event_capacity())
    }
}

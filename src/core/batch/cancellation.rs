//! Cancellation gate
//!
//! Cancellation is cooperative and polled: the runner asks the gate before
//! every chunk after the first, and a chunk already in flight always
//! completes.

use crate::utils::error::Result;
use async_trait::async_trait;
use dashmap::DashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Externally mutable cancellation flag, checked at chunk boundaries
#[async_trait]
pub trait CancellationGate: Send + Sync {
    async fn is_cancelled(&self, batch_id: &str) -> Result<bool>;
}

/// In-memory registry of batch ids whose cancellation was requested
#[derive(Debug, Default)]
pub struct CancellationRegistry {
    cancelled: DashSet<String>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag a batch as cancelled; returns false if it already was
    pub fn cancel(&self, batch_id: &str) -> bool {
        let inserted = self.cancelled.insert(batch_id.to_string());
        if inserted {
            info!(batch_id, "cancellation requested");
        }
        inserted
    }

    pub fn contains(&self, batch_id: &str) -> bool {
        self.cancelled.contains(batch_id)
    }

    /// Drop the flag once the job has reached a terminal state
    pub fn clear(&self, batch_id: &str) {
        self.cancelled.remove(batch_id);
    }

    pub fn len(&self) -> usize {
        self.cancelled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cancelled.is_empty()
    }
}

#[async_trait]
impl CancellationGate for CancellationRegistry {
    async fn is_cancelled(&self, batch_id: &str) -> Result<bool> {
        Ok(self.contains(batch_id))
    }
}

/// Gate that never cancels
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverCancel;

#[async_trait]
impl CancellationGate for NeverCancel {
    async fn is_cancelled(&self, _batch_id: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Cancelled as soon as any inner gate says so
#[derive(Clone, Default)]
pub struct AnyGate {
    gates: Vec<Arc<dyn CancellationGate>>,
}

impl AnyGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, gate: Arc<dyn CancellationGate>) -> Self {
        self.gates.push(gate);
        self
    }
}

#[async_trait]
impl CancellationGate for AnyGate {
    async fn is_cancelled(&self, batch_id: &str) -> Result<bool> {
        let mut first_error = None;
        for gate in &self.gates {
            match gate.is_cancelled(batch_id).await {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => {
                    warn!(batch_id, error = %e, "cancellation check failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(false),
        }
    }
}

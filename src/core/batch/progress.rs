//! Progress reporter
//!
//! Computes a snapshot after every chunk and publishes it on the event bus.
//! Nothing here is persisted.

use super::events::{BatchEvent, EventBus};
use super::types::{ProgressSnapshot, ProgressStage};
use tokio::time::Instant;

/// `round(current / total * 100)`, 0 when there is nothing to do
pub fn percent(current: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = current.min(total) as f64 / total as f64;
    (ratio * 100.0).round() as u8
}

/// Publishes progress snapshots for one job
#[derive(Debug)]
pub struct ProgressReporter {
    batch_id: String,
    total: usize,
    started: Instant,
    events: EventBus,
}

impl ProgressReporter {
    pub fn new(batch_id: impl Into<String>, total: usize, events: EventBus) -> Self {
        Self {
            batch_id: batch_id.into(),
            total,
            started: Instant::now(),
            events,
        }
    }

    /// Snapshot for the reset stage that runs before the first chunk
    pub fn reset(&self) -> ProgressSnapshot {
        self.emit(
            ProgressStage::Reset,
            0,
            format!("Resetting existing data before {} items", self.total),
        )
    }

    /// Snapshot after chunk `sequence` of `total_chunks` resolved
    pub fn chunk_finished(
        &self,
        current: usize,
        sequence: usize,
        total_chunks: usize,
        succeeded: bool,
    ) -> ProgressSnapshot {
        let message = if succeeded {
            format!(
                "Chunk {}/{} done, {} of {} items",
                sequence, total_chunks, current, self.total
            )
        } else {
            format!(
                "Chunk {}/{} failed, {} of {} items attempted",
                sequence, total_chunks, current, self.total
            )
        };
        self.emit(ProgressStage::Chunks, current, message)
    }

    /// Final snapshot of a run that attempted every chunk
    pub fn complete(&self, processed: usize) -> ProgressSnapshot {
        self.emit(
            ProgressStage::Complete,
            self.total,
            format!("Completed: {} of {} items applied", processed, self.total),
        )
    }

    fn emit(&self, stage: ProgressStage, current: usize, message: String) -> ProgressSnapshot {
        let snapshot = ProgressSnapshot {
            batch_id: self.batch_id.clone(),
            stage,
            current,
            total: self.total,
            percent: percent(current, self.total),
            message,
            eta_seconds: self.eta_seconds(current),
        };
        self.events.publish(BatchEvent::Progress(snapshot.clone()));
        snapshot
    }

    /// Remaining time extrapolated from the average time per item so far
    fn eta_seconds(&self, current: usize) -> Option<u64> {
        if current == 0 || current >= self.total {
            return None;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let per_item = elapsed / current as f64;
        Some((per_item * (self.total - current) as f64).round() as u64)
    }
}

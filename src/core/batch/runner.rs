//! Sequential chunk runner
//!
//! Applies chunks strictly in split order, one at a time. Chunk `i + 1` is
//! only started after chunk `i` has resolved. Every chunk-level error is
//! turned into job state and events here; nothing is thrown past `run`.

use super::cancellation::CancellationGate;
use super::events::{BatchEvent, EventBus};
use super::features::{FailurePolicy, FeatureKind, RunnerPolicy};
use super::operation::ChunkOperation;
use super::progress::ProgressReporter;
use super::splitter::split_into_chunks;
use super::types::{BatchJob, ItemOutcome, JobHandle, JobStatus, WorkItem};
use crate::core::session::SessionContext;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Final outcome of one run, as returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub batch_id: String,
    pub feature: FeatureKind,
    pub status: JobStatus,
    pub total_items: usize,
    pub total_chunks: usize,
    pub chunks_attempted: usize,
    pub processed_count: usize,
    pub failed_count: usize,
    pub failed_chunk: Option<usize>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn from_job(job: &BatchJob, elapsed: Duration) -> Self {
        Self {
            batch_id: job.id.clone(),
            feature: job.feature,
            status: job.status,
            total_items: job.total_items,
            total_chunks: job.total_chunks,
            chunks_attempted: job.chunks_attempted,
            processed_count: job.processed_count,
            failed_count: job.failed_count,
            failed_chunk: job.failed_chunk,
            error: job.error.clone(),
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Completed && self.failed_count == 0
    }
}

/// Runs one job's chunks under a [`RunnerPolicy`]
#[derive(Debug, Clone)]
pub struct ChunkRunner {
    policy: RunnerPolicy,
    events: EventBus,
}

impl ChunkRunner {
    pub fn new(policy: RunnerPolicy, events: EventBus) -> Self {
        Self { policy, events }
    }

    pub fn policy(&self) -> &RunnerPolicy {
        &self.policy
    }

    /// Drive `job` from pending to a terminal state.
    ///
    /// A job that is no longer pending (for instance cancelled before it
    /// started) is reported as-is without touching the downstream system.
    pub async fn run(
        &self,
        ctx: &SessionContext,
        job: &JobHandle,
        items: &[WorkItem],
        operation: &dyn ChunkOperation,
        gate: &dyn CancellationGate,
    ) -> RunReport {
        let started = Instant::now();

        let batch_id = {
            let mut guard = job.write().await;
            if let Err(e) = guard.transition(JobStatus::Processing) {
                warn!(batch_id = %guard.id, error = %e, "batch not started");
                return RunReport::from_job(&guard, started.elapsed());
            }
            guard.id.clone()
        };

        let span = info_span!(
            "batch",
            batch_id = %batch_id,
            user = %ctx.user_id,
            request_id = %ctx.request_id
        );

        self.execute(ctx, job, &batch_id, items, operation, gate, started)
            .instrument(span)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute(
        &self,
        ctx: &SessionContext,
        job: &JobHandle,
        batch_id: &str,
        items: &[WorkItem],
        operation: &dyn ChunkOperation,
        gate: &dyn CancellationGate,
        started: Instant,
    ) -> RunReport {
        let chunks = match split_into_chunks(items, self.policy.chunk_size) {
            Ok(chunks) => chunks,
            Err(e) => {
                let message = format!("split failed: {}", e);
                return self.finish_failed(job, None, message, started).await;
            }
        };

        let progress = ProgressReporter::new(batch_id, items.len(), self.events.clone());

        info!(
            total_items = items.len(),
            total_chunks = chunks.len(),
            chunk_size = self.policy.chunk_size,
            "Starting batch"
        );

        if chunks.is_empty() {
            return self.finish_completed(job, &progress, started).await;
        }

        if self.policy.reset_first {
            progress.reset();
            if let Err(e) = operation.reset(ctx, batch_id).await {
                error!(error = %e, "Reset stage failed, no chunk attempted");
                let message = format!("reset failed: {}", e);
                return self.finish_failed(job, None, message, started).await;
            }
        }

        let mut previous_failed = false;

        for chunk in &chunks {
            if chunk.sequence > 1 {
                let delay = self.policy.delay_after(previous_failed);
                if !delay.is_zero() {
                    debug!("Waiting {:?} before chunk {}", delay, chunk.sequence);
                    tokio::time::sleep(delay).await;
                }

                match gate.is_cancelled(batch_id).await {
                    Ok(true) => {
                        info!("Cancelled before chunk {}/{}", chunk.sequence, chunk.total);
                        return self.finish_cancelled(job, started).await;
                    }
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "Cancellation check failed, continuing"),
                }
            }

            job.write()
                .await
                .mark_items(chunk.range(), ItemOutcome::Processing, None, None);

            let chunk_started = Instant::now();
            let outcome = self
                .policy
                .retry
                .run(|attempt| async move {
                    if attempt > 1 {
                        debug!("Retrying chunk {} (attempt {})", chunk.sequence, attempt);
                    }
                    operation
                        .process_chunk(ctx, batch_id, chunk)
                        .await?
                        .into_result()
                })
                .await;
            let duration_ms = chunk_started.elapsed().as_millis() as u64;

            let current = {
                let mut guard = job.write().await;
                guard.chunks_attempted += 1;
                match &outcome.result {
                    Ok(ack) => {
                        guard.mark_items(
                            chunk.range(),
                            ItemOutcome::Success,
                            ack.message.as_deref(),
                            Some(duration_ms),
                        );
                        guard.processed_count += chunk.len();
                    }
                    Err(e) => {
                        let message = e.to_string();
                        guard.mark_items(
                            chunk.range(),
                            ItemOutcome::Error,
                            Some(&message),
                            Some(duration_ms),
                        );
                        guard.failed_count += chunk.len();
                    }
                }
                guard.processed_count + guard.failed_count
            };

            match outcome.result {
                Ok(ack) => {
                    if let Some(reported) = ack.processed_count {
                        if reported != chunk.len() {
                            warn!(
                                "Chunk {} reported {} rows for {} items",
                                chunk.sequence,
                                reported,
                                chunk.len()
                            );
                        }
                    }
                    debug!(
                        "Chunk {}/{} applied in {}ms ({} attempts)",
                        chunk.sequence, chunk.total, duration_ms, outcome.attempts
                    );
                    progress.chunk_finished(current, chunk.sequence, chunk.total, true);
                    previous_failed = false;
                }
                Err(e) => {
                    progress.chunk_finished(current, chunk.sequence, chunk.total, false);
                    match self.policy.on_error {
                        FailurePolicy::Abort => {
                            error!(
                                "Chunk {}/{} failed after {} attempts: {}",
                                chunk.sequence, chunk.total, outcome.attempts, e
                            );
                            let message =
                                format!("chunk {}/{} failed: {}", chunk.sequence, chunk.total, e);
                            return self
                                .finish_failed(job, Some(chunk.sequence), message, started)
                                .await;
                        }
                        FailurePolicy::Continue => {
                            warn!(
                                "Chunk {}/{} failed after {} attempts, moving on: {}",
                                chunk.sequence, chunk.total, outcome.attempts, e
                            );
                            previous_failed = true;
                        }
                    }
                }
            }
        }

        self.finish_completed(job, &progress, started).await
    }

    async fn finish_completed(
        &self,
        job: &JobHandle,
        progress: &ProgressReporter,
        started: Instant,
    ) -> RunReport {
        let mut guard = job.write().await;
        if let Err(e) = guard.transition(JobStatus::Completed) {
            error!(error = %e, "Could not complete batch");
        }

        progress.complete(guard.processed_count);
        self.events.publish(BatchEvent::Completed {
            batch_id: guard.id.clone(),
            total: guard.total_items,
            processed_count: guard.processed_count,
            failed_count: guard.failed_count,
        });

        info!(
            "Batch completed (processed: {}, failed: {})",
            guard.processed_count, guard.failed_count
        );
        RunReport::from_job(&guard, started.elapsed())
    }

    async fn finish_cancelled(&self, job: &JobHandle, started: Instant) -> RunReport {
        let mut guard = job.write().await;
        let total = guard.total_items;
        guard.mark_items(0..total, ItemOutcome::Cancelled, None, None);
        if let Err(e) = guard.transition(JobStatus::Cancelled) {
            error!(error = %e, "Could not cancel batch");
        }

        self.events.publish(BatchEvent::Cancelled {
            batch_id: guard.id.clone(),
            total,
            processed_count: guard.processed_count,
        });

        info!(
            "Batch cancelled, {} of {} items processed",
            guard.processed_count, total
        );
        RunReport::from_job(&guard, started.elapsed())
    }

    /// `failed_chunk` is `None` when the failure happened before any chunk
    async fn finish_failed(
        &self,
        job: &JobHandle,
        failed_chunk: Option<usize>,
        message: String,
        started: Instant,
    ) -> RunReport {
        let mut guard = job.write().await;
        guard.failed_chunk = failed_chunk;
        guard.error = Some(message.clone());
        if let Err(e) = guard.transition(JobStatus::Failed) {
            error!(error = %e, "Could not fail batch");
        }

        self.events.publish(BatchEvent::Failed {
            batch_id: guard.id.clone(),
            chunk_number: guard.failed_chunk,
            processed_count: guard.processed_count,
            error: message,
        });

        RunReport::from_job(&guard, started.elapsed())
    }
}

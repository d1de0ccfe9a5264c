//! Batch job registry
//!
//! Creates jobs, runs them through the chunk runner and keeps them
//! observable. Each job is internally serial; different jobs may run side by
//! side on separate tasks.

use super::cancellation::{AnyGate, CancellationGate, CancellationRegistry};
use super::events::{BatchEvent, EventBus};
use super::features::JobSpec;
use super::operation::ChunkOperation;
use super::runner::{ChunkRunner, RunReport};
use super::types::{BatchJob, ItemOutcome, JobHandle, JobStatus, WorkItem};
use crate::config::BatchSettings;
use crate::core::session::SessionContext;
use crate::utils::error::{Result, ServiceError};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

/// A job started on a background task
#[derive(Debug)]
pub struct SpawnedJob {
    pub batch_id: String,
    pub handle: JoinHandle<RunReport>,
}

/// Registered jobs plus every id ever handed out, so eviction does not make
/// an id reusable
#[derive(Default)]
struct JobTable {
    jobs: HashMap<String, JobHandle>,
    used_ids: HashSet<String>,
}

/// Batch manager for creating, running and cancelling jobs
#[derive(Clone)]
pub struct BatchManager {
    table: Arc<RwLock<JobTable>>,
    registry: Arc<CancellationRegistry>,
    events: EventBus,
    settings: BatchSettings,
}

impl BatchManager {
    /// Create a new manager
    pub fn new(settings: BatchSettings) -> Self {
        Self {
            table: Arc::new(RwLock::new(JobTable::default())),
            registry: Arc::new(CancellationRegistry::new()),
            events: EventBus::new(settings.event_capacity),
            settings,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to the events of every job this manager runs
    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.events.subscribe()
    }

    /// Run a job to completion on the current task.
    ///
    /// Only precondition failures are returned as errors; chunk failures and
    /// cancellation end up in the report.
    pub async fn run(
        &self,
        ctx: &SessionContext,
        spec: &JobSpec,
        items: &[WorkItem],
        operation: &dyn ChunkOperation,
        external_gate: Option<Arc<dyn CancellationGate>>,
    ) -> Result<RunReport> {
        let (job, runner) = self.prepare(ctx, spec, items).await?;
        let gate = self.gate(external_gate);
        let batch_id = job.read().await.id.clone();

        let report = runner.run(ctx, &job, items, operation, &gate).await;
        self.registry.clear(&batch_id);
        prune_table(&self.table, self.settings.retain_finished_jobs).await;
        Ok(report)
    }

    /// Start a job on a background task and return as soon as it is registered
    pub async fn spawn(
        &self,
        ctx: SessionContext,
        spec: JobSpec,
        items: Vec<WorkItem>,
        operation: Arc<dyn ChunkOperation>,
        external_gate: Option<Arc<dyn CancellationGate>>,
    ) -> Result<SpawnedJob> {
        let (job, runner) = self.prepare(&ctx, &spec, &items).await?;
        let gate = self.gate(external_gate);
        let batch_id = job.read().await.id.clone();

        let registry = self.registry.clone();
        let table = self.table.clone();
        let retain = self.settings.retain_finished_jobs;
        let id = batch_id.clone();
        let handle = tokio::spawn(async move {
            let report = runner
                .run(&ctx, &job, &items, operation.as_ref(), &gate)
                .await;
            registry.clear(&id);
            prune_table(&table, retain).await;
            report
        });

        Ok(SpawnedJob { batch_id, handle })
    }

    /// Request cancellation of a job.
    ///
    /// A pending job is cancelled at once. A running job stops at its next
    /// chunk boundary; the returned status is still `processing` then.
    pub async fn cancel(&self, batch_id: &str) -> Result<JobStatus> {
        info!("Cancelling batch: {}", batch_id);

        let job = self
            .handle(batch_id)
            .await
            .ok_or_else(|| ServiceError::not_found(format!("batch {} not found", batch_id)))?;

        let mut guard = job.write().await;
        match guard.status {
            JobStatus::Pending => {
                let total = guard.total_items;
                guard.mark_items(0..total, ItemOutcome::Cancelled, None, None);
                guard.transition(JobStatus::Cancelled)?;
                self.events.publish(BatchEvent::Cancelled {
                    batch_id: guard.id.clone(),
                    total,
                    processed_count: 0,
                });
                Ok(JobStatus::Cancelled)
            }
            JobStatus::Processing => {
                self.registry.cancel(batch_id);
                Ok(JobStatus::Processing)
            }
            status => Err(ServiceError::invalid_state(format!(
                "batch {} is already {}",
                batch_id, status
            ))),
        }
    }

    /// Snapshot of one job
    pub async fn get(&self, batch_id: &str) -> Option<BatchJob> {
        let job = self.handle(batch_id).await?;
        let guard = job.read().await;
        Some(guard.clone())
    }

    /// Drop a finished job from the manager and return its final state.
    ///
    /// Its id stays reserved. Pending and running jobs cannot be removed.
    pub async fn remove(&self, batch_id: &str) -> Result<BatchJob> {
        let mut table = self.table.write().await;
        let job = table
            .jobs
            .get(batch_id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(format!("batch {} not found", batch_id)))?;

        let snapshot = job.read().await.clone();
        if !snapshot.status.is_terminal() {
            return Err(ServiceError::invalid_state(format!(
                "batch {} is still {}",
                batch_id, snapshot.status
            )));
        }

        table.jobs.remove(batch_id);
        debug!("Removed batch {}", batch_id);
        Ok(snapshot)
    }

    /// Evict all but the `keep` most recently finished jobs; returns how many
    /// were evicted
    pub async fn prune_finished(&self, keep: usize) -> usize {
        prune_table(&self.table, keep).await
    }

    /// Number of jobs currently held
    pub async fn len(&self) -> usize {
        self.table.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshots of a user's jobs, newest first
    pub async fn list(&self, user_id: &str) -> Vec<BatchJob> {
        let handles: Vec<JobHandle> = self.table.read().await.jobs.values().cloned().collect();
        let guards = join_all(handles.iter().map(|handle| handle.read())).await;

        let mut jobs: Vec<BatchJob> = guards
            .iter()
            .filter(|job| job.user_id == user_id)
            .map(|job| BatchJob::clone(job))
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    async fn handle(&self, batch_id: &str) -> Option<JobHandle> {
        self.table.read().await.jobs.get(batch_id).cloned()
    }

    /// Validate the request and register a pending job for it
    async fn prepare(
        &self,
        ctx: &SessionContext,
        spec: &JobSpec,
        items: &[WorkItem],
    ) -> Result<(JobHandle, ChunkRunner)> {
        spec.validate(ctx)?;

        let overrides = self.settings.overrides(spec.feature);
        let policy = spec.feature.policy(overrides, spec.chunk_size)?;

        let batch_id = spec
            .batch_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let job = BatchJob::new(
            batch_id.clone(),
            ctx.user_id.clone(),
            spec.feature,
            items,
            policy.chunk_size,
        );

        let handle = {
            let mut table = self.table.write().await;
            if !table.used_ids.insert(batch_id.clone()) {
                error!("Batch id {} reused", batch_id);
                return Err(ServiceError::validation(format!(
                    "batch id {} already used, a new run needs a new id",
                    batch_id
                )));
            }
            let handle: JobHandle = Arc::new(RwLock::new(job));
            table.jobs.insert(batch_id.clone(), handle.clone());
            handle
        };

        info!(
            "Created batch {} ({}, {} items, {} per chunk)",
            batch_id,
            spec.feature,
            items.len(),
            policy.chunk_size
        );

        Ok((handle, ChunkRunner::new(policy, self.events.clone())))
    }

    fn gate(&self, external: Option<Arc<dyn CancellationGate>>) -> AnyGate {
        let gate = AnyGate::new().with(self.registry.clone());
        match external {
            Some(external) => gate.with(external),
            None => gate,
        }
    }
}

async fn prune_table(table: &RwLock<JobTable>, keep: usize) -> usize {
    let mut table = table.write().await;

    let mut finished = Vec::new();
    for (id, handle) in &table.jobs {
        let job = handle.read().await;
        if job.status.is_terminal() {
            finished.push((job.completed_at, id.clone()));
        }
    }
    if finished.len() <= keep {
        return 0;
    }

    // Newest first; everything past `keep` goes
    finished.sort_by(|a, b| b.0.cmp(&a.0));
    let evicted = finished.len() - keep;
    for (_, id) in finished.into_iter().skip(keep) {
        table.jobs.remove(&id);
    }
    debug!("Evicted {} finished batches", evicted);
    evicted
}

//! Chunked batch processing
//!
//! Large item lists are split into fixed-size chunks and applied one chunk at
//! a time against the ERP, with progress events, cooperative cancellation at
//! chunk boundaries and a fixed-delay retry policy.

mod cancellation;
mod events;
mod features;
mod manager;
mod operation;
mod progress;
mod retry;
mod runner;
mod splitter;
mod types;


// Re-export all public types
pub use cancellation::{AnyGate, CancellationGate, CancellationRegistry, NeverCancel};
pub use events::{BatchEvent, BatchEventKind, EventBus};
pub use features::{FailurePolicy, FeatureKind, JobSpec, RESERVED_PARAMS, RunnerPolicy};
pub use manager::{BatchManager, SpawnedJob};
pub use operation::{ChunkAck, ChunkOperation};
pub use progress::{ProgressReporter, percent};
pub use retry::{RetryOutcome, RetryPolicy};
pub use runner::{ChunkRunner, RunReport};
pub use splitter::{chunk_count, split_into_chunks};
pub use types::{
    BatchJob, Chunk, ItemOutcome, ItemRecord, JobHandle, JobStatus, ProgressSnapshot,
    ProgressStage, WorkItem,
};

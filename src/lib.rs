//! # replenish-batch
//!
//! Chunked batch orchestrator for ERP replenishment jobs.
//!
//! Large item lists (material codes, min/max rows, ABC analysis results) are
//! split into fixed-size chunks and applied one chunk at a time against the
//! ERP bridge. Every run is a [`BatchJob`] with progress events, cooperative
//! cancellation at chunk boundaries and a fixed-delay retry policy.
//!
//! ## Features
//!
//! - **Sequential chunk runner**: chunks never run concurrently, always in split order
//! - **Feature profiles**: ABC-analysis save and zero min/max abort on the first
//!   failed chunk; batch-queue features log, wait and carry on
//! - **Progress events**: `batch-progress`, `batch-completed`, `batch-cancelled`,
//!   `batch-failed` on a broadcast bus, optionally forwarded to webhooks
//! - **Cancellation**: in-memory registry and ERP queue status, polled between chunks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use replenish_batch::{
//!     BatchManager, Config, ErpChunkOperation, ErpClient, FeatureKind, JobSpec,
//!     SessionContext, WorkItem,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/batch.yaml").await?;
//!     let client = ErpClient::new(&config.erp)?;
//!     let manager = BatchManager::new(config.batch.clone());
//!
//!     let ctx = SessionContext::new("buyer-01");
//!     let spec = JobSpec::new(FeatureKind::ZeroMinMax).with_branch("1000");
//!     let items: Vec<WorkItem> = vec![WorkItem::new("MAT-0001"), WorkItem::new("MAT-0002")];
//!
//!     let operation = ErpChunkOperation::new(client, &spec);
//!     let report = manager.run(&ctx, &spec, &items, &operation, None).await?;
//!     println!("{}: {} processed", report.status, report.processed_count);
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod cli;
pub mod config;
pub mod core;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use utils::error::{Result, ServiceError};

pub use core::batch::{
    BatchEvent, BatchEventKind, BatchJob, BatchManager, CancellationGate, CancellationRegistry,
    Chunk, ChunkAck, ChunkOperation, ChunkRunner, EventBus, FailurePolicy, FeatureKind,
    ItemOutcome, JobSpec, JobStatus, ProgressSnapshot, ProgressStage, RetryPolicy, RunReport,
    RunnerPolicy, WorkItem, split_into_chunks,
};
pub use core::erp::{ErpChunkOperation, ErpClient, QueueStatus, QueueStatusGate};
pub use core::session::SessionContext;
pub use core::webhooks::WebhookForwarder;

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build information, filled in by the build script
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Version number
    pub version: &'static str,
    /// Build timestamp, seconds since the epoch
    pub build_time: &'static str,
    /// Git commit hash
    pub git_hash: &'static str,
    /// Rust version
    pub rust_version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: VERSION,
            build_time: option_env!("BUILD_TIME").unwrap_or("unknown"),
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
            rust_version: option_env!("RUST_VERSION").unwrap_or("unknown"),
        }
    }
}

/// Build information of this binary
pub fn build_info() -> BuildInfo {
    BuildInfo::default()
}

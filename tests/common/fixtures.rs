//! Test fixtures and data factories

use replenish_batch::{FeatureKind, JobSpec, WorkItem};
use serde_json::json;
use uuid::Uuid;

/// Factory for work items
pub struct ItemFactory;

impl ItemFactory {
    /// `n` material codes `MAT-00000`, `MAT-00001`, ...
    pub fn codes(n: usize) -> Vec<WorkItem> {
        (0..n).map(|i| WorkItem::new(format!("MAT-{:05}", i))).collect()
    }

    /// `n` min/max rows with a payload
    pub fn min_max_rows(n: usize) -> Vec<WorkItem> {
        (0..n)
            .map(|i| {
                WorkItem::with_payload(
                    format!("MAT-{:05}", i),
                    json!({ "min": 0, "max": 0, "warehouse": "W1" }),
                )
            })
            .collect()
    }
}

/// Factory for job specs with a fresh batch id
pub struct SpecFactory;

impl SpecFactory {
    pub fn batch_id() -> String {
        format!("test-{}", &Uuid::new_v4().to_string()[..8])
    }

    pub fn top_abc(chunk_size: usize) -> JobSpec {
        JobSpec::new(FeatureKind::TopAbcSave)
            .with_batch_id(Self::batch_id())
            .with_branch("1000")
            .with_chunk_size(chunk_size)
    }

    pub fn zero_min_max() -> JobSpec {
        JobSpec::new(FeatureKind::ZeroMinMax)
            .with_batch_id(Self::batch_id())
            .with_branch("1000")
    }

    pub fn queue(feature: FeatureKind, chunk_size: usize) -> JobSpec {
        JobSpec::new(feature)
            .with_batch_id(Self::batch_id())
            .with_chunk_size(chunk_size)
    }
}

//! Batch runner configuration

use crate::core::batch::FeatureKind;
use serde::{Deserialize, Serialize};

/// Default capacity of the event broadcast channel
pub fn default_event_capacity() -> usize {
    256
}

/// Default number of finished jobs a manager keeps for `get`/`list`
pub fn default_retain_finished_jobs() -> usize {
    100
}

/// Per-feature overrides of the built-in runner policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureOverrides {
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub inter_chunk_delay_ms: Option<u64>,
    #[serde(default)]
    pub failure_delay_ms: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<u32>,
}

/// Batch section of the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    #[serde(default)]
    pub top_abc_save: FeatureOverrides,
    #[serde(default)]
    pub zero_min_max: FeatureOverrides,
    #[serde(default)]
    pub queue_move_online: FeatureOverrides,
    #[serde(default)]
    pub queue_stock_evidence: FeatureOverrides,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Finished jobs kept in memory; older ones are evicted after each run
    #[serde(default = "default_retain_finished_jobs")]
    pub retain_finished_jobs: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            top_abc_save: FeatureOverrides::default(),
            zero_min_max: FeatureOverrides::default(),
            queue_move_online: FeatureOverrides::default(),
            queue_stock_evidence: FeatureOverrides::default(),
            event_capacity: default_event_capacity(),
            retain_finished_jobs: default_retain_finished_jobs(),
        }
    }
}

impl BatchSettings {
    /// Overrides configured for a feature
    pub fn overrides(&self, kind: FeatureKind) -> &FeatureOverrides {
        match kind {
            FeatureKind::TopAbcSave => &self.top_abc_save,
            FeatureKind::ZeroMinMax => &self.zero_min_max,
            FeatureKind::QueueMoveOnline => &self.queue_move_online,
            FeatureKind::QueueStockEvidence => &self.queue_stock_evidence,
        }
    }
}

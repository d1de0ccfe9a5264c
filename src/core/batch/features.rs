//! Feature profiles
//!
//! Every bulk feature runs through the same chunk runner; a profile only
//! picks the chunk size, the failure policy, the delays and the ERP methods.

use super::retry::RetryPolicy;
use crate::config::FeatureOverrides;
use crate::core::session::SessionContext;
use crate::utils::error::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// What the runner does when a chunk fails after its retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop, leave the remaining chunks unattempted, fail the job
    Abort,
    /// Log, wait the failure delay, move on to the next chunk
    Continue,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerPolicy {
    pub chunk_size: usize,
    pub on_error: FailurePolicy,
    /// Fixed throttle between consecutive chunks
    pub inter_chunk_delay: Duration,
    pub retry: RetryPolicy,
    /// Run the operation's reset hook once before chunk 1
    pub reset_first: bool,
}

impl RunnerPolicy {
    /// Delay before the chunk that follows one with the given outcome
    pub fn delay_after(&self, previous_failed: bool) -> Duration {
        if previous_failed {
            self.inter_chunk_delay.max(self.retry.delay)
        } else {
            self.inter_chunk_delay
        }
    }
}

/// Bulk features backed by the chunk runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureKind {
    /// Save a computed ABC analysis
    TopAbcSave,
    /// Zero the min/max stock levels of a set of items
    ZeroMinMax,
    /// Batch queue: put items online
    QueueMoveOnline,
    /// Batch queue: record stock evidence
    QueueStockEvidence,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 4] = [
        Self::TopAbcSave,
        Self::ZeroMinMax,
        Self::QueueMoveOnline,
        Self::QueueStockEvidence,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopAbcSave => "top-abc-save",
            Self::ZeroMinMax => "zero-min-max",
            Self::QueueMoveOnline => "queue-move-online",
            Self::QueueStockEvidence => "queue-stock-evidence",
        }
    }

    pub fn is_queue(self) -> bool {
        matches!(self, Self::QueueMoveOnline | Self::QueueStockEvidence)
    }

    /// Inclusive (min, max) chunk size
    pub fn chunk_bounds(self) -> (usize, usize) {
        match self {
            Self::TopAbcSave => (1, 2000),
            Self::ZeroMinMax => (1, 5000),
            Self::QueueMoveOnline | Self::QueueStockEvidence => (1, 100),
        }
    }

    pub fn default_chunk_size(self) -> usize {
        match self {
            Self::TopAbcSave => 500,
            Self::ZeroMinMax => 2000,
            Self::QueueMoveOnline | Self::QueueStockEvidence => 50,
        }
    }

    pub fn failure_policy(self) -> FailurePolicy {
        if self.is_queue() {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Abort
        }
    }

    pub fn inter_chunk_delay(self) -> Duration {
        if self.is_queue() {
            Duration::from_millis(2000)
        } else {
            Duration::ZERO
        }
    }

    pub fn retry_delay(self) -> Duration {
        if self.is_queue() {
            Duration::from_millis(5000)
        } else {
            Duration::from_millis(1000)
        }
    }

    /// ERP method applying one chunk
    pub fn chunk_method(self) -> &'static str {
        match self {
            Self::TopAbcSave => "saveTopAbcAnalysisChunk",
            Self::ZeroMinMax => "processZeroMinMaxBatch",
            Self::QueueMoveOnline | Self::QueueStockEvidence => "processBatch",
        }
    }

    /// ERP method clearing previous data before the first chunk
    pub fn reset_method(self) -> Option<&'static str> {
        match self {
            Self::TopAbcSave => Some("resetTopAbcAnalysis"),
            Self::ZeroMinMax => Some("resetZeroMinMax"),
            Self::QueueMoveOnline | Self::QueueStockEvidence => None,
        }
    }

    /// `action` discriminator sent with `processBatch`
    pub fn queue_action(self) -> Option<&'static str> {
        match self {
            Self::QueueMoveOnline => Some("move-online"),
            Self::QueueStockEvidence => Some("stock-evidence"),
            Self::TopAbcSave | Self::ZeroMinMax => None,
        }
    }

    /// Save features operate on one branch and refuse to run without it
    pub fn requires_branch(self) -> bool {
        !self.is_queue()
    }

    /// Resolve the runner policy: requested chunk size, then config
    /// overrides, then the built-in profile
    pub fn policy(
        self,
        overrides: &FeatureOverrides,
        requested_chunk_size: Option<usize>,
    ) -> Result<RunnerPolicy> {
        let chunk_size = requested_chunk_size
            .or(overrides.chunk_size)
            .unwrap_or_else(|| self.default_chunk_size());

        let (min, max) = self.chunk_bounds();
        if chunk_size < min || chunk_size > max {
            return Err(ServiceError::validation(format!(
                "{} chunk size must be between {} and {}, got {}",
                self, min, max, chunk_size
            )));
        }

        let inter_chunk_delay = overrides
            .inter_chunk_delay_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.inter_chunk_delay());
        let retry_delay = overrides
            .failure_delay_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.retry_delay());

        Ok(RunnerPolicy {
            chunk_size,
            on_error: self.failure_policy(),
            inter_chunk_delay,
            retry: RetryPolicy::new(retry_delay, overrides.max_retries.unwrap_or(0)),
            reset_first: self.reset_method().is_some(),
        })
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                ServiceError::validation(format!(
                    "unknown feature '{}', expected one of: {}",
                    s,
                    Self::ALL.map(FeatureKind::as_str).join(", ")
                ))
            })
    }
}

/// Field names of the ERP request bodies; `params` may not shadow them
pub const RESERVED_PARAMS: [&str; 7] = [
    "batchId",
    "chunkNumber",
    "totalChunks",
    "isLastChunk",
    "items",
    "branch",
    "action",
];

/// Caller request to start a bulk operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Caller-chosen id; a fresh one is generated when absent
    #[serde(default)]
    pub batch_id: Option<String>,
    pub feature: FeatureKind,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    /// Branch / warehouse filter selected in the UI
    #[serde(default)]
    pub branch: Option<String>,
    /// Extra fields forwarded with every ERP call
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl JobSpec {
    pub fn new(feature: FeatureKind) -> Self {
        Self {
            batch_id: None,
            feature,
            chunk_size: None,
            branch: None,
            params: serde_json::Map::new(),
        }
    }

    pub fn with_batch_id(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Reject the request before any chunk is attempted
    pub fn validate(&self, ctx: &SessionContext) -> Result<()> {
        if ctx.user_id.trim().is_empty() {
            return Err(ServiceError::validation("a batch job needs an owning user"));
        }

        if let Some(id) = &self.batch_id {
            if id.trim().is_empty() {
                return Err(ServiceError::validation("batch id cannot be blank"));
            }
        }

        if self.feature.requires_branch() {
            match self.branch.as_deref().map(str::trim) {
                Some(branch) if !branch.is_empty() => {}
                _ => {
                    return Err(ServiceError::validation(format!(
                        "{} requires a branch to be selected",
                        self.feature
                    )));
                }
            }
        }

        if let Some(key) = self
            .params
            .keys()
            .find(|key| RESERVED_PARAMS.contains(&key.as_str()))
        {
            return Err(ServiceError::validation(format!(
                "param '{}' clashes with a request field",
                key
            )));
        }

        Ok(())
    }
}

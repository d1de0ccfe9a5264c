//! Error types for the batch orchestrator

use thiserror::Error;

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Validation errors (rejected before any chunk is attempted)
    #[error("rejected: {0}")]
    Validation(String),

    /// Transport failure below the HTTP status level
    #[error("ERP transport error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("unreadable JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// The ERP answered but reported a failure
    #[error("ERP error: {0}")]
    Erp(String),

    #[error("timed out: {0}")]
    Timeout(String),

    /// Connection refused or reset
    #[error("ERP unreachable: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Illegal job state transition
    #[error("invalid state: {0}")]
    InvalidState(String),
}

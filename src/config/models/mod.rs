//! Configuration data models
//!
//! This module defines all configuration structures used by the orchestrator.

pub mod batch;
pub mod erp;
pub mod logging;
pub mod webhook;

pub use batch::*;
pub use erp::*;
pub use logging::*;
pub use webhook::*;

/// Default ERP bridge URL
pub fn default_erp_url() -> String {
    "http://localhost:3030/s1".to_string()
}

/// Default ERP request timeout in seconds
pub fn default_timeout() -> u64 {
    60
}

/// Default log level directive
pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_true() -> bool {
    true
}

//! Utility modules
//!
//! - **error**: the crate-wide error type
//! - **logging**: tracing subscriber setup and log redaction

pub mod error;
pub mod logging;

use uuid::Uuid;

/// Fresh id for correlating one CLI invocation's ERP calls
pub fn generate_request_id() -> String {
    format!("req-{}", Uuid::new_v4().simple())
}

/// Render milliseconds for progress lines and reports: `850ms`, `12.4s`,
/// `3m 20s`, `1h 05m`
pub fn format_duration(duration_ms: u64) -> String {
    let seconds = duration_ms / 1000;
    match seconds {
        0 => format!("{}ms", duration_ms),
        1..=59 => format!("{:.1}s", duration_ms as f64 / 1000.0),
        60..=3599 => format!("{}m {:02}s", seconds / 60, seconds % 60),
        _ => format!("{}h {:02}m", seconds / 3600, (seconds % 3600) / 60),
    }
}

//! Error handling for the batch orchestrator
//!
//! This module defines the error type shared by every layer of the crate.

mod helpers;
mod types;

pub use types::{Result, ServiceError};

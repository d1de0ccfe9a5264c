//! Core functionality of the batch orchestrator
//!
//! This module contains the chunked runner, the ERP bridge and the event
//! forwarding.

pub mod batch;
pub mod erp;
pub mod session;
pub mod webhooks;

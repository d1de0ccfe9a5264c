//! ERP RPC bridge
//!
//! The ERP performs all business computation; this crate only sends chunks
//! to it, asks for queue status and requests cancellation.

mod client;
mod operation;
mod types;

pub use client::ErpClient;
pub use operation::{ErpChunkOperation, QueueStatusGate};
pub use types::{BatchRequest, ChunkRequest, QueueStatus, RpcResponse};

//! Mock ERP bridge
//!
//! A wiremock server answering the RPC methods the orchestrator calls.
//! Scripted failures are mounted with a higher priority than the catch-all
//! success responses.

use replenish_batch::config::{BatchSettings, ErpConfig, FeatureOverrides};
use replenish_batch::{ErpClient, SessionContext};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-session-token";

pub struct MockErp {
    pub server: MockServer,
}

impl MockErp {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    fn path(method: &str) -> String {
        format!("/s1/{}", method)
    }

    pub fn config(&self) -> ErpConfig {
        ErpConfig {
            base_url: format!("{}/s1", self.server.uri()),
            token: Some(TOKEN.to_string()),
            timeout: 5,
            poll_queue_status: true,
        }
    }

    pub fn client(&self) -> ErpClient {
        ErpClient::new(&self.config()).expect("client")
    }

    pub fn session(user: &str) -> SessionContext {
        SessionContext::new(user).with_token(TOKEN)
    }

    /// Settings with every delay switched off, so tests run in real time
    pub fn fast_settings() -> BatchSettings {
        let fast = FeatureOverrides {
            chunk_size: None,
            inter_chunk_delay_ms: Some(0),
            failure_delay_ms: Some(0),
            max_retries: None,
        };
        BatchSettings {
            top_abc_save: fast.clone(),
            zero_min_max: fast.clone(),
            queue_move_online: fast.clone(),
            queue_stock_evidence: fast,
            ..BatchSettings::default()
        }
    }

    /// Answer `method` with `{ success: true }`
    pub async fn accept(&self, rpc: &str) {
        Mock::given(method("POST"))
            .and(path(Self::path(rpc)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .with_priority(5)
            .mount(&self.server)
            .await;
    }

    /// Answer chunk `chunk_number` of `method` with `{ success: false }`
    pub async fn reject_chunk(&self, rpc: &str, chunk_number: usize) {
        Mock::given(method("POST"))
            .and(path(Self::path(rpc)))
            .and(body_partial_json(json!({ "chunkNumber": chunk_number })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": format!("chunk {} rejected", chunk_number)
            })))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Answer `method` with an HTTP error status
    pub async fn http_error(&self, rpc: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(Self::path(rpc)))
            .respond_with(ResponseTemplate::new(status).set_body_string("bridge unavailable"))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// `getQueueStatus` answers `processing` `times` times, then `cancelled`
    pub async fn cancel_after_status_checks(&self, times: u64) {
        if times > 0 {
            Mock::given(method("POST"))
                .and(path(Self::path("getQueueStatus")))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({ "success": true, "status": "processing" })),
                )
                .up_to_n_times(times)
                .with_priority(1)
                .mount(&self.server)
                .await;
        }
        Mock::given(method("POST"))
            .and(path(Self::path("getQueueStatus")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "status": "cancelled" })),
            )
            .with_priority(5)
            .mount(&self.server)
            .await;
    }

    /// JSON bodies received for `method`, in arrival order
    pub async fn bodies(&self, rpc: &str) -> Vec<Value> {
        let expected = Self::path(rpc);
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == expected)
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }

    /// `chunkNumber`s received for `method` and `batch_id`, in arrival order
    pub async fn chunk_numbers(&self, rpc: &str, batch_id: &str) -> Vec<u64> {
        self.bodies(rpc)
            .await
            .iter()
            .filter(|body| body["batchId"] == batch_id)
            .filter_map(|body| body["chunkNumber"].as_u64())
            .collect()
    }
}

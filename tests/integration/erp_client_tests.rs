//! ERP client integration tests
//!
//! Transport failures, HTTP errors and malformed replies must map onto the
//! crate error type the runner turns into failure events.

#[cfg(test)]
mod tests {
    use crate::assert_ok;
    use crate::common::MockErp;
    use crate::common::erp::TOKEN;
    use replenish_batch::config::ErpConfig;
    use replenish_batch::{ErpClient, ServiceError, SessionContext};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn test_token_and_request_id_are_sent() {
        let erp = MockErp::start().await;
        Mock::given(method("POST"))
            .and(path("/s1/getQueueStatus"))
            .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
            .and(header("X-Request-Id", "req-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "status": "processing",
                "processedCount": 120,
                "totalCount": 300
            })))
            .expect(1)
            .mount(&erp.server)
            .await;

        let ctx = MockErp::session("buyer").with_request_id("req-42");
        let status = assert_ok!(erp.client().get_queue_status(&ctx, "q-1").await);

        assert_eq!(status.status, "processing");
        assert_eq!(status.processed_count, Some(120));
        assert_eq!(status.total_count, Some(300));
        assert!(!status.is_cancelled());

        let bodies = erp.bodies("getQueueStatus").await;
        assert_eq!(bodies[0]["batchId"], "q-1");
    }

    #[tokio::test]
    async fn test_cancel_queue() {
        let erp = MockErp::start().await;
        erp.accept("cancelQueue").await;

        let ctx = MockErp::session("buyer");
        let response = assert_ok!(erp.client().cancel_queue(&ctx, "q-7").await);
        assert!(response.success);
        assert_eq!(erp.bodies("cancelQueue").await[0]["batchId"], "q-7");
    }

    #[tokio::test]
    async fn test_cancel_queue_refused() {
        let erp = MockErp::start().await;
        Mock::given(method("POST"))
            .and(path("/s1/cancelQueue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "queue already finished"
            })))
            .mount(&erp.server)
            .await;

        let err = erp
            .client()
            .cancel_queue(&MockErp::session("buyer"), "q-8")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Erp(msg) if msg.contains("queue already finished")));
    }

    #[tokio::test]
    async fn test_status_failure_reply_is_an_error() {
        let erp = MockErp::start().await;
        Mock::given(method("POST"))
            .and(path("/s1/getQueueStatus"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": false, "error": "unknown queue" })),
            )
            .mount(&erp.server)
            .await;

        let err = erp
            .client()
            .get_queue_status(&MockErp::session("buyer"), "missing")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown queue"));
    }

    #[tokio::test]
    async fn test_http_status_maps_to_erp_error() {
        let erp = MockErp::start().await;
        erp.http_error("getQueueStatus", 503).await;

        let err = erp
            .client()
            .get_queue_status(&MockErp::session("buyer"), "q-1")
            .await
            .unwrap_err();
        assert!(matches!(&err, ServiceError::Erp(msg) if msg.contains("HTTP 503")));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_malformed_reply_is_serialization_error() {
        let erp = MockErp::start().await;
        Mock::given(method("POST"))
            .and(path("/s1/getQueueStatus"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&erp.server)
            .await;

        let err = erp
            .client()
            .get_queue_status(&MockErp::session("buyer"), "q-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_slow_reply_times_out() {
        let erp = MockErp::start().await;
        Mock::given(method("POST"))
            .and(path("/s1/getQueueStatus"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "status": "processing" }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&erp.server)
            .await;

        let client = assert_ok!(ErpClient::new(&ErpConfig {
            timeout: 1,
            ..erp.config()
        }));
        let err = client
            .get_queue_status(&SessionContext::new("buyer"), "q-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_unreachable_bridge_is_network_error() {
        let client = assert_ok!(ErpClient::new(&ErpConfig {
            base_url: "http://127.0.0.1:1/s1".to_string(),
            timeout: 2,
            ..ErpConfig::default()
        }));

        let err = client
            .get_queue_status(&SessionContext::new("buyer"), "q-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Network(_)));
    }
}

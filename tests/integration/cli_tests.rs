//! `batch-runner run` end to end, with webhooks

#[cfg(test)]
mod tests {
    use crate::assert_ok;
    use crate::common::MockErp;
    use replenish_batch::FeatureKind;
    use replenish_batch::cli::{self, Cli, Command, RunArgs};
    use std::io::Write;
    use std::process::ExitCode;
    use std::time::Duration;
    use tempfile::NamedTempFile;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write");
        file
    }

    #[tokio::test]
    async fn test_run_delivers_webhooks_before_returning() {
        let erp = MockErp::start().await;
        erp.accept("processBatch").await;

        let hook = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
            .mount(&hook)
            .await;

        let config = temp_file(&format!(
            r#"
erp:
  base_url: "{}/s1"
  timeout: 5
  poll_queue_status: false
batch:
  queue_move_online:
    inter_chunk_delay_ms: 0
    failure_delay_ms: 0
logging:
  level: "warn"
webhooks:
  - url: "{}/events"
"#,
            erp.server.uri(),
            hook.uri()
        ));
        let items = temp_file(r#"["MAT-00001", "MAT-00002"]"#);

        let cli = Cli {
            config: Some(config.path().to_path_buf()),
            command: Command::Run(RunArgs {
                feature: FeatureKind::QueueMoveOnline,
                items: items.path().to_path_buf(),
                chunk_size: Some(1),
                branch: None,
                user: "buyer".to_string(),
                batch_id: None,
                json: false,
            }),
        };

        let code = assert_ok!(cli::execute(cli).await);
        assert_eq!(format!("{:?}", code), format!("{:?}", ExitCode::SUCCESS));

        let events: Vec<String> = hook
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request| request.headers.get("X-Batch-Event"))
            .filter_map(|value| value.to_str().ok().map(str::to_string))
            .collect();
        assert_eq!(events.last().map(String::as_str), Some("batch-completed"));
        assert!(events.iter().any(|kind| kind == "batch-progress"));
    }
}

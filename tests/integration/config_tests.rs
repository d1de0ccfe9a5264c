//! Configuration file loading

#[cfg(test)]
mod tests {
    use crate::{assert_err, assert_ok};
    use replenish_batch::config::{ENV_ERP_TIMEOUT, ENV_ERP_URL, LogFormat};
    use replenish_batch::{Config, FeatureKind, FailurePolicy, ServiceError};
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write config");
        file
    }

    #[tokio::test]
    async fn test_load_file_with_feature_overrides() {
        let file = write_config(
            r#"
erp:
  base_url: "https://erp.example.com/s1"
  timeout: 20
batch:
  queue_move_online:
    chunk_size: 40
    inter_chunk_delay_ms: 250
  zero_min_max:
    max_retries: 2
logging:
  format: "json"
"#,
        );

        let config = assert_ok!(Config::from_file(file.path()).await);
        assert_eq!(config.erp.timeout, 20);
        assert_eq!(config.logging.format, LogFormat::Json);

        let queue = assert_ok!(
            FeatureKind::QueueMoveOnline
                .policy(config.batch.overrides(FeatureKind::QueueMoveOnline), None)
        );
        assert_eq!(queue.chunk_size, 40);
        assert_eq!(queue.inter_chunk_delay, Duration::from_millis(250));
        assert_eq!(queue.on_error, FailurePolicy::Continue);

        // An explicit job chunk size beats the file
        let explicit = assert_ok!(
            FeatureKind::QueueMoveOnline
                .policy(config.batch.overrides(FeatureKind::QueueMoveOnline), Some(10))
        );
        assert_eq!(explicit.chunk_size, 10);

        let save = assert_ok!(
            FeatureKind::ZeroMinMax.policy(config.batch.overrides(FeatureKind::ZeroMinMax), None)
        );
        assert_eq!(save.retry.max_retries, 2);
        assert_eq!(save.on_error, FailurePolicy::Abort);
    }

    #[tokio::test]
    async fn test_out_of_bounds_chunk_size_rejected() {
        let file = write_config(
            r#"
batch:
  top_abc_save:
    chunk_size: 100000
"#,
        );

        let err = assert_err!(Config::from_file(file.path()).await);
        assert!(matches!(err, ServiceError::Config(_)));
        assert!(err.to_string().contains("top-abc-save"));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let file = write_config(
            r#"
erp:
  base_url: "ftp://erp.example.com/s1"
"#,
        );

        let err = assert_err!(Config::from_file(file.path()).await);
        assert!(err.to_string().contains("ERP config error"));
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = assert_err!(Config::from_file(dir.path().join("absent.yaml")).await);
        assert!(matches!(err, ServiceError::Config(_)));
    }

    #[test]
    fn test_lookup_overrides_beat_file_values() {
        let mut config = assert_ok!(Config::from_yaml_str(
            r#"
erp:
  base_url: "https://file.example.com/s1"
  timeout: 30
"#
        ));

        assert_ok!(config.apply_overrides_from(|key| match key {
            k if k == ENV_ERP_URL => Some("https://env.example.com/s1".to_string()),
            k if k == ENV_ERP_TIMEOUT => Some("5".to_string()),
            _ => None,
        }));

        assert_eq!(config.erp.base_url, "https://env.example.com/s1");
        assert_eq!(config.erp.timeout, 5);
        assert_ok!(config.validate());
    }

    #[test]
    fn test_unparsable_timeout_override() {
        let mut config = Config::default();
        let err = assert_err!(config.apply_overrides_from(|key| {
            (key == ENV_ERP_TIMEOUT).then(|| "soon".to_string())
        }));
        assert!(err.to_string().contains(ENV_ERP_TIMEOUT));
    }
}

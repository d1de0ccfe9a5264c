//! End-to-end runs against a mock ERP
//!
//! Each test drives the public `BatchManager` API with the real ERP client
//! and checks both the returned report and what the ERP actually received.

#[cfg(test)]
mod tests {
    use crate::common::{ItemFactory, MockErp, SpecFactory};
    use crate::{assert_err, assert_ok};
    use replenish_batch::{
        BatchEvent, BatchManager, CancellationGate, ErpChunkOperation, FeatureKind, JobStatus,
        QueueStatusGate, ServiceError,
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn test_top_abc_aborts_on_third_chunk() {
        let erp = MockErp::start().await;
        erp.accept("resetTopAbcAnalysis").await;
        erp.accept("saveTopAbcAnalysisChunk").await;
        erp.reject_chunk("saveTopAbcAnalysisChunk", 3).await;

        let manager = BatchManager::new(MockErp::fast_settings());
        let mut events = manager.subscribe();
        let spec = SpecFactory::top_abc(500);
        let batch_id = spec.batch_id.clone().unwrap();
        let operation = ErpChunkOperation::new(erp.client(), &spec);

        let report = assert_ok!(
            manager
                .run(
                    &MockErp::session("buyer"),
                    &spec,
                    &ItemFactory::codes(2500),
                    &operation,
                    None
                )
                .await
        );

        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.total_chunks, 5);
        assert_eq!(report.processed_count, 1000);
        assert_eq!(report.failed_chunk, Some(3));
        assert!(report.error.as_deref().unwrap().contains("chunk 3 rejected"));

        assert_eq!(
            erp.chunk_numbers("saveTopAbcAnalysisChunk", &batch_id).await,
            vec![1, 2, 3]
        );
        let resets = erp.bodies("resetTopAbcAnalysis").await;
        assert_eq!(resets.len(), 1);
        assert_eq!(resets[0]["branch"], "1000");

        let mut last = None;
        while let Ok(event) = events.try_recv() {
            last = Some(event);
        }
        assert!(matches!(
            last,
            Some(BatchEvent::Failed {
                chunk_number: Some(3),
                processed_count: 1000,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_chunk_bodies_carry_position_and_items() {
        let erp = MockErp::start().await;
        erp.accept("resetZeroMinMax").await;
        erp.accept("processZeroMinMaxBatch").await;

        let manager = BatchManager::new(MockErp::fast_settings());
        let spec = SpecFactory::zero_min_max()
            .with_chunk_size(2)
            .with_param("period", serde_json::json!("2024-06"));
        let operation = ErpChunkOperation::new(erp.client(), &spec);

        let report = assert_ok!(
            manager
                .run(
                    &MockErp::session("buyer"),
                    &spec,
                    &ItemFactory::min_max_rows(3),
                    &operation,
                    None
                )
                .await
        );
        assert_eq!(report.status, JobStatus::Completed);
        assert!(report.is_success());

        let bodies = erp.bodies("processZeroMinMaxBatch").await;
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0]["chunkNumber"], 1);
        assert_eq!(bodies[0]["totalChunks"], 2);
        assert_eq!(bodies[0]["isLastChunk"], false);
        assert_eq!(bodies[0]["items"][1]["code"], "MAT-00001");
        assert_eq!(bodies[0]["items"][1]["payload"]["warehouse"], "W1");
        assert_eq!(bodies[1]["isLastChunk"], true);
        assert_eq!(bodies[1]["items"].as_array().unwrap().len(), 1);
        assert_eq!(bodies[1]["period"], "2024-06");
    }

    #[tokio::test]
    async fn test_queue_continues_past_failed_chunk() {
        let erp = MockErp::start().await;
        erp.accept("processBatch").await;
        erp.reject_chunk("processBatch", 3).await;
        erp.cancel_after_status_checks(100).await;

        let manager = BatchManager::new(MockErp::fast_settings());
        let ctx = MockErp::session("buyer");
        let spec = SpecFactory::queue(FeatureKind::QueueMoveOnline, 2);
        let batch_id = spec.batch_id.clone().unwrap();
        let operation = ErpChunkOperation::new(erp.client(), &spec);
        let gate: Arc<dyn CancellationGate> =
            Arc::new(QueueStatusGate::new(erp.client(), ctx.clone()));

        let report = assert_ok!(
            manager
                .run(&ctx, &spec, &ItemFactory::codes(10), &operation, Some(gate))
                .await
        );

        assert_eq!(report.status, JobStatus::Completed);
        assert_eq!(report.processed_count, 8);
        assert_eq!(report.failed_count, 2);
        assert_eq!(
            erp.chunk_numbers("processBatch", &batch_id).await,
            vec![1, 2, 3, 4, 5]
        );
        assert_eq!(erp.bodies("processBatch").await[0]["action"], "move-online");

        // One status check before each chunk after the first
        assert_eq!(erp.bodies("getQueueStatus").await.len(), 4);
    }

    #[tokio::test]
    async fn test_queue_status_cancels_between_chunks() {
        let erp = MockErp::start().await;
        erp.accept("processBatch").await;
        // processing before chunk 2, cancelled before chunk 3
        erp.cancel_after_status_checks(1).await;

        let manager = BatchManager::new(MockErp::fast_settings());
        let mut events = manager.subscribe();
        let ctx = MockErp::session("buyer");
        let spec = SpecFactory::queue(FeatureKind::QueueStockEvidence, 3);
        let batch_id = spec.batch_id.clone().unwrap();
        let operation = ErpChunkOperation::new(erp.client(), &spec);
        let gate: Arc<dyn CancellationGate> =
            Arc::new(QueueStatusGate::new(erp.client(), ctx.clone()));

        let report = assert_ok!(
            manager
                .run(&ctx, &spec, &ItemFactory::codes(15), &operation, Some(gate))
                .await
        );

        assert_eq!(report.status, JobStatus::Cancelled);
        assert_eq!(report.processed_count, 6);
        assert_eq!(
            erp.chunk_numbers("processBatch", &batch_id).await,
            vec![1, 2]
        );

        let cancelled = std::iter::from_fn(|| events.try_recv().ok())
            .find(|event| matches!(event, BatchEvent::Cancelled { .. }));
        assert!(matches!(
            cancelled,
            Some(BatchEvent::Cancelled {
                processed_count: 6,
                total: 15,
                ..
            })
        ));

        let job = manager.get(&batch_id).await.unwrap();
        assert!(job.counts_consistent());
        assert_eq!(job.status, JobStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_empty_list_makes_no_calls() {
        let erp = MockErp::start().await;
        erp.accept("resetTopAbcAnalysis").await;
        erp.accept("saveTopAbcAnalysisChunk").await;

        let manager = BatchManager::new(MockErp::fast_settings());
        let spec = SpecFactory::top_abc(500);
        let operation = ErpChunkOperation::new(erp.client(), &spec);

        let report = assert_ok!(
            manager
                .run(&MockErp::session("buyer"), &spec, &[], &operation, None)
                .await
        );

        assert_eq!(report.status, JobStatus::Completed);
        assert_eq!(report.total_chunks, 0);
        assert!(
            erp.server
                .received_requests()
                .await
                .unwrap_or_default()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_http_error_fails_save_job() {
        let erp = MockErp::start().await;
        erp.accept("resetZeroMinMax").await;
        erp.http_error("processZeroMinMaxBatch", 502).await;

        let manager = BatchManager::new(MockErp::fast_settings());
        let spec = SpecFactory::zero_min_max();
        let operation = ErpChunkOperation::new(erp.client(), &spec);

        let report = assert_ok!(
            manager
                .run(
                    &MockErp::session("buyer"),
                    &spec,
                    &ItemFactory::min_max_rows(4500),
                    &operation,
                    None
                )
                .await
        );

        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.failed_chunk, Some(1));
        assert_eq!(report.processed_count, 0);
        assert_eq!(report.total_chunks, 3);
        let error = report.error.unwrap();
        assert!(error.starts_with("chunk 1/3 failed"));
        assert!(error.contains("HTTP 502"));
    }

    #[tokio::test]
    async fn test_missing_branch_rejected_before_any_call() {
        let erp = MockErp::start().await;
        let manager = BatchManager::new(MockErp::fast_settings());
        let spec = replenish_batch::JobSpec::new(FeatureKind::TopAbcSave);
        let operation = ErpChunkOperation::new(erp.client(), &spec);

        let err = assert_err!(
            manager
                .run(
                    &MockErp::session("buyer"),
                    &spec,
                    &ItemFactory::codes(10),
                    &operation,
                    None
                )
                .await
        );

        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(
            erp.server
                .received_requests()
                .await
                .unwrap_or_default()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_concurrent_jobs_stay_serial() {
        let erp = MockErp::start().await;
        erp.accept("processBatch").await;

        let manager = BatchManager::new(MockErp::fast_settings());
        let mut spawned = Vec::new();
        let mut ids = Vec::new();
        for feature in [FeatureKind::QueueMoveOnline, FeatureKind::QueueStockEvidence] {
            let spec = SpecFactory::queue(feature, 4);
            let operation = Arc::new(ErpChunkOperation::new(erp.client(), &spec));
            let job = assert_ok!(
                manager
                    .spawn(
                        MockErp::session("buyer"),
                        spec,
                        ItemFactory::codes(20),
                        operation,
                        None
                    )
                    .await
            );
            ids.push(job.batch_id.clone());
            spawned.push(job.handle);
        }

        let reports = futures::future::join_all(spawned).await;
        for report in reports {
            let report = report.unwrap();
            assert_eq!(report.status, JobStatus::Completed);
            assert_eq!(report.processed_count, 20);
        }

        for id in &ids {
            assert_eq!(
                erp.chunk_numbers("processBatch", id).await,
                vec![1, 2, 3, 4, 5]
            );
        }
        assert_eq!(manager.list("buyer").await.len(), 2);
    }
}

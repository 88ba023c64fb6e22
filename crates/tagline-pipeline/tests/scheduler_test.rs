mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{conversations, fast_config, success, ByIdTransport, EchoSender};
use tagline_llm::{AnalysisTransport, Classification, OpenAITransport};
use tagline_persist::{CheckpointStore, JsonlCheckpointStore};
use tagline_pipeline::{KeyPool, PipelineError, RetryingFetcher, Scheduler};
use tagline_types::PipelineConfig;

async fn scheduler(
    path: &std::path::Path,
    keys: &str,
    transport: Arc<dyn AnalysisTransport>,
    sender: Arc<EchoSender>,
    config: &PipelineConfig,
) -> (Scheduler, Arc<KeyPool>, Arc<JsonlCheckpointStore>) {
    let pool = Arc::new(KeyPool::from_lines(keys));
    let store = Arc::new(JsonlCheckpointStore::open(path).await.unwrap());
    let fetcher = Arc::new(RetryingFetcher::new(Arc::clone(&pool), transport, sender, config));
    let scheduler = Scheduler::new(fetcher, store.clone(), config);
    (scheduler, pool, store)
}

fn ids(records: &[tagline_types::EnrichedRecord]) -> Vec<u64> {
    let mut ids: Vec<u64> = records.iter().map(|r| r.id()).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_second_run_resumes_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checkpoint.jsonl");
    let config = fast_config();

    let sender = Arc::new(EchoSender::new());
    let transport = Arc::new(ByIdTransport::new(|id| success(&format!("title {}", id))));
    let (first, _, _) = scheduler(&path, "K1\nK2", transport.clone(), sender.clone(), &config).await;
    let report = first.run(conversations(12)).await.unwrap();

    assert_eq!(ids(&report.records), (1..=12).collect::<Vec<_>>());
    assert_eq!(report.stats.succeeded, 12);
    assert_eq!(sender.sends(), 12);

    let idle = Arc::new(EchoSender::new());
    let (second, _, _) = scheduler(&path, "K1\nK2", transport, idle.clone(), &config).await;
    let again = second.run(conversations(12)).await.unwrap();

    assert_eq!(idle.sends(), 0);
    assert_eq!(again.stats.skipped, 12);
    assert_eq!(again.stats.attempted, 0);
    assert_eq!(again.records, report.records);
}

#[tokio::test(start_paused = true)]
async fn test_failed_conversations_are_retried_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checkpoint.jsonl");
    let config = fast_config();

    let flaky = Arc::new(ByIdTransport::new(|id| {
        if id % 3 == 0 {
            Classification::Retryable("HTTP 500".to_string())
        } else {
            success("ok")
        }
    }));
    let (first, _, _) = scheduler(&path, "K1", flaky, Arc::new(EchoSender::new()), &config).await;
    let report = first.run(conversations(9)).await.unwrap();

    assert_eq!(ids(&report.records), vec![1, 2, 4, 5, 7, 8]);
    assert_eq!(report.stats.succeeded, 6);
    assert_eq!(report.stats.failed, 3);

    let healthy = Arc::new(ByIdTransport::new(|_| success("ok")));
    let sender = Arc::new(EchoSender::new());
    let (second, _, _) = scheduler(&path, "K1", healthy, sender.clone(), &config).await;
    let report = second.run(conversations(9)).await.unwrap();

    assert_eq!(sender.sends(), 3);
    assert_eq!(report.stats.skipped, 6);
    assert_eq!(ids(&report.records), (1..=9).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn test_worker_limit_bounds_in_flight_requests() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::new().with_max_concurrent_requests(3);

    let sender = Arc::new(EchoSender::with_latency(Duration::from_millis(50)));
    let transport = Arc::new(ByIdTransport::new(|_| success("ok")));
    let (scheduler, _, _) = scheduler(
        &dir.path().join("checkpoint.jsonl"),
        "K1\nK2\nK3",
        transport,
        sender.clone(),
        &config,
    )
    .await;

    let report = scheduler.run(conversations(20)).await.unwrap();

    assert_eq!(report.records.len(), 20);
    let peak = sender.max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {} exceeded limit", peak);
    assert!(peak >= 2, "requests never overlapped");
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_pool_degrades_run_without_error() {
    let dir = tempfile::tempdir().unwrap();
    let sender = Arc::new(EchoSender::new());
    let transport = Arc::new(ByIdTransport::new(|_| Classification::FatalAuth));
    let (scheduler, pool, store) = scheduler(
        &dir.path().join("checkpoint.jsonl"),
        "BAD1\nBAD2",
        transport,
        sender.clone(),
        &fast_config(),
    )
    .await;

    let report = scheduler.run(conversations(10)).await.unwrap();

    assert!(pool.is_empty());
    assert!(report.records.is_empty());
    assert_eq!(report.stats.failed, 10);
    assert_eq!(sender.sends(), 2);
    assert!(store.load_completed_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_provider_config_is_reported_before_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let sender = Arc::new(EchoSender::new());
    let transport = Arc::new(OpenAITransport::new(None, Some("gpt-4o-mini".to_string()), 0.2));
    let (scheduler, pool, _) = scheduler(
        &dir.path().join("checkpoint.jsonl"),
        "K1",
        transport,
        sender.clone(),
        &fast_config(),
    )
    .await;

    let err = scheduler.run(conversations(3)).await.unwrap_err();

    assert!(matches!(err, PipelineError::Config(_)));
    assert_eq!(sender.sends(), 0);
    assert_eq!(pool.checkouts(), 0);
}

#[tokio::test]
async fn test_duplicate_input_ids_dispatch_once() {
    let dir = tempfile::tempdir().unwrap();
    let sender = Arc::new(EchoSender::new());
    let transport = Arc::new(ByIdTransport::new(|_| success("ok")));
    let (scheduler, _, _) = scheduler(
        &dir.path().join("checkpoint.jsonl"),
        "K1",
        transport,
        sender.clone(),
        &fast_config(),
    )
    .await;

    let mut input = conversations(3);
    input.push(input[0].clone());
    let report = scheduler.run(input).await.unwrap();

    assert_eq!(sender.sends(), 3);
    assert_eq!(ids(&report.records), vec![1, 2, 3]);
}

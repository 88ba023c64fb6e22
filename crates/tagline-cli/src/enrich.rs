// Wiring from settings to a scheduler run
// Anything that keeps analysis from starting degrades to un-enriched output;
// only checkpoint I/O failures abort.

use crate::settings::Settings;
use std::path::Path;
use std::sync::Arc;
use tagline_llm::{ReqwestSender, RequestSender, TransportFactory};
use tagline_persist::JsonlCheckpointStore;
use tagline_pipeline::{KeyPool, PipelineError, RetryingFetcher, Scheduler};
use tagline_types::{finalize, ConversationRecord, FinalRecord};

/// Load the credential pool, or `None` when there is nothing usable
pub async fn load_key_pool(path: &Path) -> anyhow::Result<Option<KeyPool>> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::error!("Credential file {} not found", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let pool = KeyPool::from_lines(&text);
    if pool.is_empty() {
        tracing::error!("Credential file {} is empty", path.display());
        return Ok(None);
    }
    Ok(Some(pool))
}

/// Enrich conversations through the configured provider
pub async fn enrich(
    conversations: Vec<ConversationRecord>,
    settings: &Settings,
) -> anyhow::Result<Vec<FinalRecord>> {
    let config = settings.pipeline_config();
    let sender: Arc<dyn RequestSender> = Arc::new(ReqwestSender::new(config.request_timeout)?);
    enrich_with(conversations, settings, sender).await
}

/// Same as [`enrich`] with a caller-supplied HTTP sender
pub async fn enrich_with(
    conversations: Vec<ConversationRecord>,
    settings: &Settings,
    sender: Arc<dyn RequestSender>,
) -> anyhow::Result<Vec<FinalRecord>> {
    let Some(pool) = load_key_pool(&settings.paths.keys_file).await? else {
        tracing::warn!("Skipping analysis, reporting {} conversations untagged", conversations.len());
        return Ok(finalize(conversations));
    };

    let config = settings.pipeline_config();
    let transport = TransportFactory::create(&settings.llm, config.temperature);
    tracing::info!(
        "Loaded {} credentials for provider {}",
        pool.len(),
        transport.provider()
    );

    let store = Arc::new(JsonlCheckpointStore::open(&settings.paths.checkpoint).await?);
    let fetcher = Arc::new(RetryingFetcher::new(
        Arc::new(pool),
        transport,
        sender,
        &config,
    ));
    let scheduler = Scheduler::new(fetcher, store, &config);

    match scheduler.run(conversations.clone()).await {
        Ok(report) => {
            tracing::info!(
                "Analysis finished: {} succeeded, {} failed, {} resumed",
                report.stats.succeeded,
                report.stats.failed,
                report.stats.skipped
            );
            Ok(finalize(report.records))
        }
        Err(PipelineError::Config(msg)) => {
            tracing::error!("Analysis disabled: {}", msg);
            Ok(finalize(conversations))
        }
        Err(e) => Err(e.into()),
    }
}

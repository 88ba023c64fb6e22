use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tagline_persist::{CheckpointStore, PersistError};
use tagline_types::{ConversationRecord, EnrichedRecord, PipelineConfig};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{PipelineError, Result};
use crate::fetcher::RetryingFetcher;

/// Counters for one scheduler run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    /// Already present in the checkpoint before this run
    pub skipped: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Everything ever checkpointed, plus what this run did
#[derive(Debug, Clone)]
pub struct RunReport {
    pub records: Vec<EnrichedRecord>,
    pub stats: RunStats,
}

enum TaskOutcome {
    Committed,
    Failed,
}

/// Bounded-concurrency dispatcher over the conversations not yet checkpointed
pub struct Scheduler {
    fetcher: Arc<RetryingFetcher>,
    store: Arc<dyn CheckpointStore>,
    max_concurrent: usize,
}

impl Scheduler {
    pub fn new(
        fetcher: Arc<RetryingFetcher>,
        store: Arc<dyn CheckpointStore>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            fetcher,
            store,
            max_concurrent: config.max_concurrent_requests.max(1),
        }
    }

    pub async fn run(&self, conversations: Vec<ConversationRecord>) -> Result<RunReport> {
        let completed = self.store.load_completed_ids().await?;
        let total = conversations.len();
        let skipped = conversations
            .iter()
            .filter(|c| completed.contains(&c.id))
            .count();

        let mut seen = HashSet::new();
        let pending: Vec<ConversationRecord> = conversations
            .into_iter()
            .filter(|c| !completed.contains(&c.id))
            .filter(|c| {
                let first = seen.insert(c.id);
                if !first {
                    tracing::warn!("Duplicate conversation id {} in input, dispatching once", c.id);
                }
                first
            })
            .collect();

        let mut stats = RunStats {
            total,
            skipped,
            ..RunStats::default()
        };

        if pending.is_empty() {
            tracing::info!("All conversations already analyzed; loading from checkpoint");
            let records = self.store.replay_all().await?;
            return Ok(RunReport { records, stats });
        }

        self.fetcher
            .transport()
            .validate()
            .map_err(PipelineError::Config)?;

        stats.attempted = pending.len();
        tracing::info!(
            "Analyzing {} new conversations with {} ({} workers, {} keys)",
            pending.len(),
            self.fetcher.transport().provider(),
            self.max_concurrent,
            self.fetcher.pool().len()
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let finished = Arc::new(AtomicUsize::new(0));
        let attempted = pending.len();
        let mut tasks = JoinSet::new();

        for conversation in pending {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let fetcher = Arc::clone(&self.fetcher);
            let store = Arc::clone(&self.store);
            let finished = Arc::clone(&finished);

            tasks.spawn(async move {
                let _permit = permit;
                let id = conversation.id;
                let outcome = match fetcher.fetch(&conversation).await {
                    Some(analysis) => {
                        let record = EnrichedRecord::new(conversation, analysis);
                        store.append(&record).await?;
                        TaskOutcome::Committed
                    }
                    None => TaskOutcome::Failed,
                };

                let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::info!("Progress {}/{} (conversation {})", done, attempted, id);
                Ok::<TaskOutcome, PersistError>(outcome)
            });
        }

        let mut persist_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(TaskOutcome::Committed)) => stats.succeeded += 1,
                Ok(Ok(TaskOutcome::Failed)) => stats.failed += 1,
                Ok(Err(e)) => {
                    tracing::error!("Failed to write checkpoint: {}", e);
                    stats.failed += 1;
                    persist_error.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!("Analysis task aborted: {}", e);
                    stats.failed += 1;
                }
            }
        }

        if let Some(e) = persist_error {
            return Err(e.into());
        }

        tracing::info!(
            "Analysis finished: {} succeeded, {} failed, {} previously done",
            stats.succeeded,
            stats.failed,
            stats.skipped
        );

        let records = self.store.replay_all().await?;
        Ok(RunReport { records, stats })
    }
}

use async_trait::async_trait;
use std::collections::HashSet;
use tagline_types::EnrichedRecord;

use crate::error::Result;

/// Durable record of completed enrichment work, keyed by conversation id
///
/// Implementations must tolerate a log truncated by a crash: partial entries
/// are skipped on read, never reported as errors.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Ids of every fully written record
    async fn load_completed_ids(&self) -> Result<HashSet<u64>>;

    /// Persist one record; returns `false` when the id was already committed
    async fn append(&self, record: &EnrichedRecord) -> Result<bool>;

    /// Every readable record in write order, duplicates included
    async fn replay_all(&self) -> Result<Vec<EnrichedRecord>>;
}

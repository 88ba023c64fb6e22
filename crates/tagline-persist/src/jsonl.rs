use async_trait::async_trait;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tagline_types::EnrichedRecord;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::trait_store::CheckpointStore;

struct Writer {
    file: Option<File>,
    committed: HashSet<u64>,
    /// The log ended mid-line when opened; terminate that line before appending
    needs_newline: bool,
}

/// Checkpoint log with one JSON object per line, opened in append mode
///
/// Physical writes go through a single mutex so a record is always written
/// with one `write_all` followed by a flush. Appends are guarded by the set of
/// ids already on disk, so a record is committed at most once per store.
pub struct JsonlCheckpointStore {
    path: PathBuf,
    writer: Mutex<Writer>,
}

impl JsonlCheckpointStore {
    /// Open (or prepare to create) the log at `path`
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = read_log(&path).await?;

        let committed = contents
            .as_deref()
            .map(|c| completed_ids(c, &path))
            .unwrap_or_default();
        let needs_newline = contents
            .as_deref()
            .is_some_and(|c| !c.is_empty() && !c.ends_with('\n'));

        if needs_newline {
            tracing::warn!(
                "Checkpoint {} ends with a partial record; it will be skipped",
                path.display()
            );
        }
        tracing::debug!(
            "Opened checkpoint {} with {} completed records",
            path.display(),
            committed.len()
        );

        Ok(Self {
            path,
            writer: Mutex::new(Writer {
                file: None,
                committed,
                needs_newline,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open_for_append(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        Ok(file)
    }
}

#[async_trait]
impl CheckpointStore for JsonlCheckpointStore {
    async fn load_completed_ids(&self) -> Result<HashSet<u64>> {
        let contents = read_log(&self.path).await?;
        Ok(contents
            .as_deref()
            .map(|c| completed_ids(c, &self.path))
            .unwrap_or_default())
    }

    async fn append(&self, record: &EnrichedRecord) -> Result<bool> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        if writer.committed.contains(&record.id()) {
            tracing::warn!("Conversation {} already checkpointed, skipping append", record.id());
            return Ok(false);
        }

        if writer.file.is_none() {
            writer.file = Some(self.open_for_append().await?);
        }
        let needs_newline = writer.needs_newline;
        if let Some(file) = writer.file.as_mut() {
            if needs_newline {
                line.insert(0, '\n');
            }
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
            file.sync_data().await?;
        }

        writer.needs_newline = false;
        writer.committed.insert(record.id());
        Ok(true)
    }

    async fn replay_all(&self) -> Result<Vec<EnrichedRecord>> {
        let Some(contents) = read_log(&self.path).await? else {
            return Ok(Vec::new());
        };

        Ok(parse_log(&contents, &self.path))
    }
}

async fn read_log(path: &Path) -> Result<Option<String>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// A line counts only if it is a complete record
fn parse_line(line: &str) -> Option<serde_json::Result<EnrichedRecord>> {
    if line.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(line))
}

/// Every readable record in log order; other lines are skipped with a warning
fn parse_log(contents: &str, path: &Path) -> Vec<EnrichedRecord> {
    contents
        .lines()
        .enumerate()
        .filter_map(|(n, line)| match parse_line(line)? {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(
                    "Skipping unreadable checkpoint line {} in {}: {}",
                    n + 1,
                    path.display(),
                    e
                );
                None
            }
        })
        .collect()
}

fn completed_ids(contents: &str, path: &Path) -> HashSet<u64> {
    parse_log(contents, path).iter().map(EnrichedRecord::id).collect()
}

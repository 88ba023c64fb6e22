use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Title used in reports for conversations that were never analyzed
pub const UNTITLED: &str = "Untitled";

/// One parsed prompt/response pair
///
/// The id is assigned once by the archive parser and stays stable across runs,
/// which is what makes checkpoint resumption possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: u64,
    pub timestamp: String,
    pub user_prompt: String,
    pub ai_response: String,
}

impl ConversationRecord {
    pub fn new(
        id: u64,
        timestamp: impl Into<String>,
        user_prompt: impl Into<String>,
        ai_response: impl Into<String>,
    ) -> Self {
        Self {
            id,
            timestamp: timestamp.into(),
            user_prompt: user_prompt.into(),
            ai_response: ai_response.into(),
        }
    }
}

/// Title and tags produced by the model for one conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub index_title: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AnalysisResult {
    pub fn new(index_title: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            index_title: index_title.into(),
            tags,
        }
    }
}

/// A conversation merged with its analysis; one line of the checkpoint log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub conversation: ConversationRecord,
    #[serde(flatten)]
    pub analysis: AnalysisResult,
}

impl EnrichedRecord {
    pub fn new(conversation: ConversationRecord, analysis: AnalysisResult) -> Self {
        Self {
            conversation,
            analysis,
        }
    }

    pub fn id(&self) -> u64 {
        self.conversation.id
    }
}

/// Record shape handed to reporting consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalRecord {
    pub id: u64,
    pub timestamp: String,
    pub title: String,
    pub tags: Vec<String>,
    pub user_prompt_cleaned: String,
    pub ai_response_cleaned: String,
}

impl From<EnrichedRecord> for FinalRecord {
    fn from(record: EnrichedRecord) -> Self {
        Self {
            id: record.conversation.id,
            timestamp: record.conversation.timestamp,
            title: record.analysis.index_title,
            tags: record.analysis.tags,
            user_prompt_cleaned: record.conversation.user_prompt,
            ai_response_cleaned: record.conversation.ai_response,
        }
    }
}

impl From<ConversationRecord> for FinalRecord {
    fn from(record: ConversationRecord) -> Self {
        Self {
            id: record.id,
            timestamp: record.timestamp,
            title: UNTITLED.to_string(),
            tags: Vec::new(),
            user_prompt_cleaned: record.user_prompt,
            ai_response_cleaned: record.ai_response,
        }
    }
}

/// Sort by id and keep the first record seen for each id
pub fn finalize<I, R>(records: I) -> Vec<FinalRecord>
where
    I: IntoIterator<Item = R>,
    R: Into<FinalRecord>,
{
    let mut seen = HashSet::new();
    let mut out: Vec<FinalRecord> = records
        .into_iter()
        .map(Into::into)
        .filter(|r: &FinalRecord| seen.insert(r.id))
        .collect();
    out.sort_by_key(|r| r.id);
    out
}

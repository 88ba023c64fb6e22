use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tagline_llm::{
    analysis_prompt, AnalysisTransport, Classification, KeyAction, RequestSender,
};
use tagline_types::{AnalysisResult, ConversationRecord, PipelineConfig};

use crate::key_pool::KeyPool;

/// Drives one "analyze conversation" call to completion
///
/// Each attempt checks out a credential, sends one request and acts on the
/// classification. Failure is reported as `None`; it is never an error for
/// the caller.
pub struct RetryingFetcher {
    pool: Arc<KeyPool>,
    transport: Arc<dyn AnalysisTransport>,
    sender: Arc<dyn RequestSender>,
    max_attempts: u32,
    retry_delay: Duration,
    exhaustion_reported: AtomicBool,
}

impl RetryingFetcher {
    pub fn new(
        pool: Arc<KeyPool>,
        transport: Arc<dyn AnalysisTransport>,
        sender: Arc<dyn RequestSender>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            pool,
            transport,
            sender,
            max_attempts: config.max_retry_attempts,
            retry_delay: config.retry_delay,
            exhaustion_reported: AtomicBool::new(false),
        }
    }

    pub fn pool(&self) -> &Arc<KeyPool> {
        &self.pool
    }

    pub fn transport(&self) -> &Arc<dyn AnalysisTransport> {
        &self.transport
    }

    pub async fn fetch(&self, conversation: &ConversationRecord) -> Option<AnalysisResult> {
        let id = conversation.id;
        let provider = self.transport.provider();
        let prompt = analysis_prompt(conversation);

        for attempt in 1..=self.max_attempts {
            let credential = match self.pool.checkout() {
                Ok(credential) => credential,
                Err(_) => {
                    self.report_exhaustion();
                    return None;
                }
            };

            let outcome = match self.transport.build_request(conversation, &prompt, &credential) {
                Ok(request) => match self.sender.send(request).await {
                    Ok(response) => self.transport.parse_response(response.status, &response.body),
                    Err(e) => Classification::Retryable(format!("request failed: {:#}", e)),
                },
                Err(classification) => classification,
            };

            match outcome {
                Classification::Success(result) => {
                    tracing::debug!(
                        "Conversation {} analyzed by {} on attempt {}",
                        id,
                        provider,
                        attempt
                    );
                    return Some(result);
                }
                Classification::RateLimited(KeyAction::Remove) => {
                    let (_, left) = self.pool.remove_and_count(&credential);
                    tracing::warn!(
                        "[rate limit] key [{}] hit 429 on conversation {}, removed ({} left)",
                        credential,
                        id,
                        left
                    );
                }
                Classification::RateLimited(KeyAction::Rotate) => {
                    tracing::warn!(
                        "[rate limit] key [{}] hit 429 on conversation {}, rotating",
                        credential,
                        id
                    );
                }
                Classification::FatalAuth => {
                    let (_, left) = self.pool.remove_and_count(&credential);
                    tracing::warn!(
                        "[auth] key [{}] rejected on conversation {}, removed ({} left)",
                        credential,
                        id,
                        left
                    );
                }
                Classification::Retryable(reason) => {
                    tracing::warn!(
                        "[retry] conversation {} attempt {}/{} with key [{}]: {}",
                        id,
                        attempt,
                        self.max_attempts,
                        credential,
                        reason
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
                Classification::FatalConfig(reason) => {
                    tracing::error!("[config] {} provider cannot run: {}", provider, reason);
                    return None;
                }
            }
        }

        tracing::warn!(
            "[final failure] conversation {} failed after {} attempts",
            id,
            self.max_attempts
        );
        None
    }

    fn report_exhaustion(&self) {
        if !self.exhaustion_reported.swap(true, Ordering::Relaxed) {
            tracing::error!(
                "All {} API keys are exhausted or invalid; remaining conversations are skipped",
                self.transport.provider()
            );
        }
    }
}

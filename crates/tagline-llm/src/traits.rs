use crate::config::ProviderType;
use crate::credential::Credential;
use serde_json::Value;
use tagline_types::{AnalysisResult, ConversationRecord};

/// What to do with a credential after a rate-limit response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// The provider tracks quota per key; drop the key for the rest of the run
    Remove,
    /// Keep the key and let rotation pick another one next attempt
    Rotate,
}

/// Normalized outcome of one provider call
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Success(AnalysisResult),
    RateLimited(KeyAction),
    Retryable(String),
    FatalAuth,
    FatalConfig(String),
}

/// Provider-agnostic description of one HTTP POST
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl TransportRequest {
    pub fn new(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// One variant per supported provider
///
/// A transport only knows the provider's wire shapes; sending is done by a
/// [`crate::http::RequestSender`] so retry logic can be tested without a network.
pub trait AnalysisTransport: Send + Sync {
    fn provider(&self) -> ProviderType;

    /// Check that everything the provider needs is configured
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    fn build_request(
        &self,
        conversation: &ConversationRecord,
        prompt: &str,
        credential: &Credential,
    ) -> Result<TransportRequest, Classification>;

    fn parse_response(&self, status: u16, body: &str) -> Classification;
}

/// Shared mapping for non-200 statuses
pub(crate) fn classify_error_status(status: u16, on_rate_limit: KeyAction) -> Classification {
    match status {
        429 => Classification::RateLimited(on_rate_limit),
        401 | 403 => Classification::FatalAuth,
        other => Classification::Retryable(format!("HTTP {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            classify_error_status(429, KeyAction::Remove),
            Classification::RateLimited(KeyAction::Remove)
        );
        assert_eq!(
            classify_error_status(429, KeyAction::Rotate),
            Classification::RateLimited(KeyAction::Rotate)
        );
        assert_eq!(classify_error_status(401, KeyAction::Rotate), Classification::FatalAuth);
        assert_eq!(classify_error_status(403, KeyAction::Remove), Classification::FatalAuth);
        assert_eq!(
            classify_error_status(503, KeyAction::Remove),
            Classification::Retryable("HTTP 503".to_string())
        );
    }
}

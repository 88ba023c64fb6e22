// Gemini generateContent transport

use crate::analysis::parse_analysis;
use crate::config::ProviderType;
use crate::credential::Credential;
use crate::traits::{
    classify_error_status, AnalysisTransport, Classification, KeyAction, TransportRequest,
};
use serde::Deserialize;
use tagline_types::ConversationRecord;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini transport
///
/// Gemini rate limits track per-key quota, so a 429 retires the key for the
/// rest of the run.
#[derive(Debug, Clone)]
pub struct GeminiTransport {
    base_url: String,
    model: String,
    temperature: f32,
}

impl GeminiTransport {
    pub fn new(model: Option<String>, base_url: Option<String>, temperature: f32) -> Self {
        Self {
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl AnalysisTransport for GeminiTransport {
    fn provider(&self) -> ProviderType {
        ProviderType::Gemini
    }

    fn build_request(
        &self,
        _conversation: &ConversationRecord,
        prompt: &str,
        credential: &Credential,
    ) -> Result<TransportRequest, Classification> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": self.temperature,
                "response_mime_type": "application/json",
            },
        });

        Ok(TransportRequest::new(url, body).header("x-goog-api-key", credential.expose()))
    }

    fn parse_response(&self, status: u16, body: &str) -> Classification {
        if status != 200 {
            return classify_error_status(status, KeyAction::Remove);
        }

        let raw: GenerateContentResponse = match serde_json::from_str(body) {
            Ok(raw) => raw,
            Err(e) => return Classification::Retryable(format!("malformed Gemini body: {}", e)),
        };

        let text = raw
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text));

        match text {
            Some(text) => match parse_analysis(&text) {
                Ok(result) => Classification::Success(result),
                Err(reason) => Classification::Retryable(reason),
            },
            None => Classification::Retryable("Gemini response carried no text part".to_string()),
        }
    }
}

// ============================================================================
// GEMINI RESPONSE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

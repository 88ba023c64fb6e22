// OpenAI-compatible chat completions transport

use crate::analysis::parse_analysis;
use crate::config::ProviderType;
use crate::credential::Credential;
use crate::prompt::SYSTEM_PROMPT;
use crate::traits::{
    classify_error_status, AnalysisTransport, Classification, KeyAction, TransportRequest,
};
use serde::Deserialize;
use tagline_types::ConversationRecord;

/// OpenAI-compatible transport
///
/// There is no default endpoint: compatible gateways differ, so both
/// `base_url` and `model` must come from settings. A 429 only rotates to the
/// next key; the key stays in the pool.
#[derive(Debug, Clone)]
pub struct OpenAITransport {
    base_url: Option<String>,
    model: Option<String>,
    temperature: f32,
}

impl OpenAITransport {
    pub fn new(base_url: Option<String>, model: Option<String>, temperature: f32) -> Self {
        Self {
            base_url: base_url
                .filter(|u| !u.trim().is_empty())
                .map(|u| u.trim_end_matches('/').to_string()),
            model: model.filter(|m| !m.trim().is_empty()),
            temperature,
        }
    }

    fn endpoint(&self) -> Result<(&str, &str), String> {
        match (self.base_url.as_deref(), self.model.as_deref()) {
            (Some(base_url), Some(model)) => Ok((base_url, model)),
            _ => Err("OpenAI base_url or model is not configured".to_string()),
        }
    }
}

impl AnalysisTransport for OpenAITransport {
    fn provider(&self) -> ProviderType {
        ProviderType::OpenAI
    }

    fn validate(&self) -> Result<(), String> {
        self.endpoint().map(|_| ())
    }

    fn build_request(
        &self,
        _conversation: &ConversationRecord,
        prompt: &str,
        credential: &Credential,
    ) -> Result<TransportRequest, Classification> {
        let (base_url, model) = self.endpoint().map_err(Classification::FatalConfig)?;

        let body = serde_json::json!({
            "model": model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
            "temperature": self.temperature,
            "response_format": {"type": "json_object"},
        });

        Ok(
            TransportRequest::new(format!("{}/chat/completions", base_url), body)
                .header("Authorization", format!("Bearer {}", credential.expose())),
        )
    }

    fn parse_response(&self, status: u16, body: &str) -> Classification {
        if status != 200 {
            return classify_error_status(status, KeyAction::Rotate);
        }

        let raw: ChatCompletion = match serde_json::from_str(body) {
            Ok(raw) => raw,
            Err(e) => return Classification::Retryable(format!("malformed OpenAI body: {}", e)),
        };

        match raw.choices.into_iter().next().and_then(|c| c.message.content) {
            Some(content) => match parse_analysis(&content) {
                Ok(result) => Classification::Success(result),
                Err(reason) => Classification::Retryable(reason),
            },
            None => Classification::Retryable("OpenAI response carried no content".to_string()),
        }
    }
}

// ============================================================================
// OPENAI-SPECIFIC RESPONSE TYPES (for Chat Completions)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> OpenAITransport {
        OpenAITransport::new(
            Some("https://gateway.test/v1/".to_string()),
            Some("gpt-4o-mini".to_string()),
            0.2,
        )
    }

    #[test]
    fn test_build_request_shape() {
        let conversation = ConversationRecord::new(1, "ts", "A", "B");
        let request = configured()
            .build_request(&conversation, "PROMPT", &Credential::new("sk-9999"))
            .unwrap();

        assert_eq!(request.url, "https://gateway.test/v1/chat/completions");
        assert!(request
            .headers
            .contains(&("Authorization".to_string(), "Bearer sk-9999".to_string())));
        assert_eq!(request.body["model"], "gpt-4o-mini");
        assert_eq!(request.body["messages"][1]["content"], "PROMPT");
        assert_eq!(request.body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_missing_config_is_fatal() {
        let transport = OpenAITransport::new(None, Some("gpt-4o".to_string()), 0.2);
        assert!(transport.validate().is_err());

        let conversation = ConversationRecord::new(1, "ts", "A", "B");
        let err = transport
            .build_request(&conversation, "PROMPT", &Credential::new("sk"))
            .unwrap_err();
        assert!(matches!(err, Classification::FatalConfig(_)));

        let blank = OpenAITransport::new(Some("  ".to_string()), Some("gpt-4o".to_string()), 0.2);
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_rate_limit_rotates_without_removal() {
        assert_eq!(
            configured().parse_response(429, "{}"),
            Classification::RateLimited(KeyAction::Rotate)
        );
        assert_eq!(configured().parse_response(401, "{}"), Classification::FatalAuth);
    }

    #[test]
    fn test_parse_success() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "{\"index_title\": \"T\", \"tags\": [\"a\"]}"}}]}"#;
        match configured().parse_response(200, body) {
            Classification::Success(result) => {
                assert_eq!(result.index_title, "T");
                assert_eq!(result.tags, vec!["a"]);
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }
}

// Configuration layer for provider selection
// The active transport is chosen once at startup from settings

use crate::gemini::GeminiTransport;
use crate::openai::OpenAITransport;
use crate::traits::AnalysisTransport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Type of LLM provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    Gemini,
    OpenAI,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::Gemini => write!(f, "gemini"),
            ProviderType::OpenAI => write!(f, "openai"),
        }
    }
}

/// Provider settings as they appear in the settings document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default, alias = "ai_provider")]
    pub provider: ProviderType,
    /// Provider-specific model id (Gemini falls back to its default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Required for OpenAI-compatible providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl LlmSettings {
    pub fn new(provider: ProviderType) -> Self {
        Self {
            provider,
            model: None,
            base_url: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Factory for creating the analysis transport from settings
pub struct TransportFactory;

impl TransportFactory {
    /// Create the transport for the configured provider
    ///
    /// Missing OpenAI fields do not fail here; the transport reports them as
    /// `FatalConfig` so the pipeline can surface the problem once.
    pub fn create(settings: &LlmSettings, temperature: f32) -> Arc<dyn AnalysisTransport> {
        match settings.provider {
            ProviderType::Gemini => Arc::new(GeminiTransport::new(
                settings.model.clone(),
                settings.base_url.clone(),
                temperature,
            )),
            ProviderType::OpenAI => Arc::new(OpenAITransport::new(
                settings.base_url.clone(),
                settings.model.clone(),
                temperature,
            )),
        }
    }
}

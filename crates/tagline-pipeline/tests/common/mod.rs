// Test doubles shared by the pipeline integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tagline_llm::{
    AnalysisTransport, Classification, Credential, ProviderType, RawResponse, RequestSender,
    TransportRequest,
};
use tagline_types::{AnalysisResult, ConversationRecord, PipelineConfig};

pub fn conversations(n: u64) -> Vec<ConversationRecord> {
    (1..=n)
        .map(|id| {
            ConversationRecord::new(
                id,
                format!("2025年8月{}日 10:00:00 JST", id),
                format!("question {}", id),
                format!("answer {}", id),
            )
        })
        .collect()
}

pub fn success(title: &str) -> Classification {
    Classification::Success(AnalysisResult::new(title, vec!["x".into(), "y".into()]))
}

pub fn fast_config() -> PipelineConfig {
    PipelineConfig::new()
        .with_retry_delay(Duration::from_secs(2))
        .with_max_concurrent_requests(4)
}

/// Plays back a fixed list of classifications, one per response, and records
/// which credential each request was built with
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Classification>>,
    fallback: Classification,
    pub credentials: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Classification>, fallback: Classification) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            credentials: Mutex::new(Vec::new()),
        }
    }

    pub fn used_credentials(&self) -> Vec<String> {
        self.credentials.lock().unwrap().clone()
    }
}

impl AnalysisTransport for ScriptedTransport {
    fn provider(&self) -> ProviderType {
        ProviderType::Gemini
    }

    fn build_request(
        &self,
        conversation: &ConversationRecord,
        _prompt: &str,
        credential: &Credential,
    ) -> Result<TransportRequest, Classification> {
        self.credentials
            .lock()
            .unwrap()
            .push(credential.expose().to_string());
        Ok(TransportRequest::new("http://scripted.test", json!({"id": conversation.id})))
    }

    fn parse_response(&self, _status: u16, _body: &str) -> Classification {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Decides the outcome from the conversation id echoed back in the body
pub struct ByIdTransport<F> {
    decide: F,
}

impl<F> ByIdTransport<F>
where
    F: Fn(u64) -> Classification + Send + Sync,
{
    pub fn new(decide: F) -> Self {
        Self { decide }
    }
}

impl<F> AnalysisTransport for ByIdTransport<F>
where
    F: Fn(u64) -> Classification + Send + Sync,
{
    fn provider(&self) -> ProviderType {
        ProviderType::OpenAI
    }

    fn build_request(
        &self,
        conversation: &ConversationRecord,
        _prompt: &str,
        _credential: &Credential,
    ) -> Result<TransportRequest, Classification> {
        Ok(TransportRequest::new("http://by-id.test", json!({"id": conversation.id})))
    }

    fn parse_response(&self, _status: u16, body: &str) -> Classification {
        let value: serde_json::Value = serde_json::from_str(body).unwrap();
        (self.decide)(value["id"].as_u64().unwrap())
    }
}

/// Echoes the request body back with status 200 and tracks concurrency
#[derive(Default)]
pub struct EchoSender {
    pub sends: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub latency: Duration,
    pub fail_transport: bool,
}

impl EchoSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_transport: true,
            ..Self::default()
        }
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestSender for EchoSender {
    async fn send(&self, request: TransportRequest) -> anyhow::Result<RawResponse> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_transport {
            anyhow::bail!("connection reset by peer");
        }
        Ok(RawResponse {
            status: 200,
            body: request.body.to_string(),
        })
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}

// HTTP execution of transport requests

use crate::traits::TransportRequest;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::time::Duration;

/// Status code and raw body of a provider response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Performs the physical POST for a [`TransportRequest`]
///
/// An `Err` means the request never produced an HTTP response (timeout,
/// connection failure, unreadable body).
#[async_trait]
pub trait RequestSender: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse>;
}

/// reqwest-backed sender (HTTP direct, no SDK)
pub struct ReqwestSender {
    http_client: reqwest::Client,
}

impl ReqwestSender {
    /// Create a sender whose every request is bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl RequestSender for ReqwestSender {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name: {}", name))?;
            let value = HeaderValue::from_str(value).context("Invalid header value")?;
            headers.insert(name, value);
        }

        let response = self
            .http_client
            .post(&request.url)
            .headers(headers)
            .json(&request.body)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status().as_u16();
        tracing::debug!("POST {} -> {}", request.url, status);
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        Ok(RawResponse { status, body })
    }
}

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs shared by the fetcher and the scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub max_concurrent_requests: usize,
    pub max_retry_attempts: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub temperature: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 10,
            max_retry_attempts: 5,
            retry_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(180),
            temperature: 0.2,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Worker limit; clamped to at least one worker
    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max.max(1);
        self
    }

    pub fn with_max_retry_attempts(mut self, attempts: u32) -> Self {
        self.max_retry_attempts = attempts;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_concurrent_requests, 10);
        assert_eq!(config.max_retry_attempts, 5);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_secs(180));
    }

    #[test]
    fn test_builder_clamps_workers() {
        let config = PipelineConfig::new()
            .with_max_concurrent_requests(0)
            .with_max_retry_attempts(3)
            .with_retry_delay(Duration::ZERO);

        assert_eq!(config.max_concurrent_requests, 1);
        assert_eq!(config.max_retry_attempts, 3);
        assert_eq!(config.retry_delay, Duration::ZERO);
    }
}

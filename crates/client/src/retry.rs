use std::time::Duration;

use tracing::warn;

use crate::error::{ClientError, Result};

/// Backoff schedule for idempotent reads.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub delays: Vec<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delays: vec![Duration::from_millis(500), Duration::from_secs(1)],
        }
    }
}

impl RetryConfig {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delays: Vec::new(),
        }
    }
}

/// Sends a GET, retrying on transport errors and 5xx responses.
///
/// 4xx responses and the final attempt are returned as-is.
pub async fn retry_get(
    request: impl Fn() -> reqwest::RequestBuilder,
    config: &RetryConfig,
) -> Result<reqwest::Response> {
    let max_attempts = config.max_retries + 1;
    let mut attempt = 0;
    loop {
        let delay = config.delays.get(attempt).copied();
        let retry = attempt + 1 < max_attempts;
        match request().send().await {
            Ok(resp) if resp.status().is_server_error() && retry => {
                warn!(
                    "GET attempt {}/{} failed (HTTP {}), retrying in {:?}",
                    attempt + 1,
                    max_attempts,
                    resp.status(),
                    delay.unwrap_or_default(),
                );
            }
            Ok(resp) => return Ok(resp),
            Err(e) if retry && !e.is_timeout() => {
                warn!(
                    "GET attempt {}/{} failed ({}), retrying in {:?}",
                    attempt + 1,
                    max_attempts,
                    e,
                    delay.unwrap_or_default(),
                );
            }
            Err(e) => return Err(ClientError::from(e)),
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        attempt += 1;
    }
}

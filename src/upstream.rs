use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tokio::sync::Semaphore;

use crate::config::UpstreamConfig;

/// Longest slice of a rejected upstream body kept for error reporting.
const MAX_ERROR_BODY_CHARS: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamError {
    Unreachable(String),
    Timeout(Duration),
    Rejected { status: u16, body: String },
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::Unreachable(msg) => write!(f, "Upstream unreachable: {msg}"),
            UpstreamError::Timeout(after) => {
                write!(f, "Upstream timed out after {}ms", after.as_millis())
            }
            UpstreamError::Rejected { status, body } => {
                write!(f, "Upstream rejected request with status {status}: {body}")
            }
        }
    }
}

impl std::error::Error for UpstreamError {}

/// Single-attempt HTTP client for the analysis service.
pub struct UpstreamClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
            permits: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// Send `payload` upstream and return the response body of a 2xx reply.
    ///
    /// The deadline covers waiting for a concurrency permit as well as the
    /// request itself.
    pub async fn analyse(&self, payload: &str) -> Result<String, UpstreamError> {
        match tokio::time::timeout(self.timeout, self.send(payload)).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(self.timeout)),
        }
    }

    async fn send(&self, payload: &str) -> Result<String, UpstreamError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| UpstreamError::Unreachable(format!("Upstream permits closed: {e}")))?;

        let mut req = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .body(payload.to_owned())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect::<String>();
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        resp.text().await.map_err(|e| self.classify(e))
    }

    fn classify(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else {
            UpstreamError::Unreachable(err.to_string())
        }
    }
}

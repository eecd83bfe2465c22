//! Client for the remote maintenance API.
//!
//! Read-only forwarding with a bounded timeout and no retries; callers
//! decide how to degrade when the remote side is unreachable.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("remote API request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("remote API returned {0}")]
    Status(StatusCode),
}

impl ProxyError {
    /// Whether serving local data instead is the right reaction: timeouts,
    /// connection failures, and remote 5xx responses.
    pub fn is_fallback(&self) -> bool {
        match self {
            ProxyError::Request(e) => e.is_timeout() || e.is_connect(),
            ProxyError::Status(status) => status.is_server_error(),
        }
    }
}

#[derive(Clone)]
pub struct RemoteApiClient {
    client: Client,
    base_url: String,
}

impl RemoteApiClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET a JSON document from the remote API.
    pub async fn get_json(&self, path: &str) -> Result<Value, ProxyError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(url = %url, "forwarding to remote maintenance API");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "remote maintenance API error");
            return Err(ProxyError::Status(status));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_trigger_fallback() {
        assert!(ProxyError::Status(StatusCode::INTERNAL_SERVER_ERROR).is_fallback());
        assert!(ProxyError::Status(StatusCode::BAD_GATEWAY).is_fallback());
        assert!(!ProxyError::Status(StatusCode::NOT_FOUND).is_fallback());
        assert!(!ProxyError::Status(StatusCode::UNAUTHORIZED).is_fallback());
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let client = RemoteApiClient::new("http://remote.example/api/", None).unwrap();
        assert_eq!(client.base_url, "http://remote.example/api");
    }
}

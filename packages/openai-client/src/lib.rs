//! Minimal client for OpenAI-compatible chat completion APIs.
//!
//! The client is stateless apart from its HTTP connection pool. The provider
//! URL and API key travel with each call as an [`Endpoint`].
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{ChatRequest, Endpoint, Message, OpenAIClient};
//!
//! let client = OpenAIClient::new();
//! let endpoint = Endpoint::new("https://dashscope.aliyuncs.com/compatible-mode/v1", api_key);
//!
//! let response = client
//!     .chat_completion(
//!         &endpoint,
//!         &ChatRequest::new("qwen-plus")
//!             .message(Message::system("You are a news analyst."))
//!             .message(Message::user("Summarize today's headlines."))
//!             .temperature(0.3),
//!     )
//!     .await?;
//! ```

pub mod credentials;
pub mod error;
pub mod types;

pub use credentials::{Endpoint, SecretString};
pub use error::{OpenAIError, Result};
pub use types::*;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

/// Default request timeout for a single completion.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Chat completion client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    timeout: Duration,
}

impl Default for OpenAIClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAIClient {
    pub fn new() -> Self {
        Self {
            http_client: Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a preconfigured HTTP client (proxies, custom TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Chat completion.
    ///
    /// Sends the conversation to `{base_url}/chat/completions` and returns the
    /// first choice's content.
    pub async fn chat_completion(
        &self,
        endpoint: &Endpoint,
        request: &ChatRequest,
    ) -> Result<ChatResponse> {
        if endpoint.api_key().is_empty() {
            return Err(OpenAIError::Config("API key not configured".into()));
        }
        if endpoint.base_url().is_empty() {
            return Err(OpenAIError::Config("base URL not configured".into()));
        }

        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(endpoint.chat_completions_url())
            .bearer_auth(endpoint.api_key().expose())
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "chat completion request failed");
                OpenAIError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "chat completion API error");
            return Err(OpenAIError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let raw: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))?;

        let chat_response = raw
            .into_response()
            .ok_or_else(|| OpenAIError::Api("response contained no choices".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis() as u64,
            chars = chat_response.content.len(),
            "chat completion"
        );

        Ok(chat_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_is_a_config_error() {
        let client = OpenAIClient::new();
        let endpoint = Endpoint::new("https://llm.example.com/v1", "");

        let err = client
            .chat_completion(&endpoint, &ChatRequest::new("qwen-plus"))
            .await
            .unwrap_err();

        assert!(matches!(err, OpenAIError::Config(_)));
    }

    #[tokio::test]
    async fn missing_base_url_is_a_config_error() {
        let client = OpenAIClient::new();
        let endpoint = Endpoint::new("", "sk-test");

        let err = client
            .chat_completion(&endpoint, &ChatRequest::new("qwen-plus"))
            .await
            .unwrap_err();

        assert!(matches!(err, OpenAIError::Config(_)));
    }
}

//! [`LanguageModel`] over an OpenAI-compatible chat endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use newsroom::ai::OpenAiModel;
//! use newsroom::traits::AiContext;
//! use openai_client::Endpoint;
//!
//! let model = OpenAiModel::new();
//! let ctx = AiContext::new(Endpoint::new("https://dashscope.aliyuncs.com/compatible-mode/v1", key), "qwen-plus");
//! let reply = model.complete(&ctx, &prompt).await?;
//! ```

use async_trait::async_trait;
use openai_client::{ChatRequest, Message, OpenAIClient};
use std::time::Duration;

use crate::error::Result;
use crate::traits::{AiContext, LanguageModel, Prompt};

/// Stateless chat model; everything per-call comes from the [`AiContext`].
#[derive(Clone, Default)]
pub struct OpenAiModel {
    client: OpenAIClient,
}

impl OpenAiModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }
}

/// Build the chat request for one prompt.
pub fn chat_request(ctx: &AiContext, prompt: &Prompt) -> ChatRequest {
    ChatRequest::new(&ctx.model)
        .message(Message::system(&prompt.system))
        .message(Message::user(&prompt.user))
        .temperature(prompt.temperature)
        .max_tokens(ctx.max_tokens)
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(&self, ctx: &AiContext, prompt: &Prompt) -> Result<String> {
        let request = chat_request(ctx, prompt);
        let response = self.client.chat_completion(&ctx.endpoint, &request).await?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NewsroomError;
    use openai_client::Endpoint;

    #[test]
    fn request_carries_context_and_prompt() {
        let ctx = AiContext::new(Endpoint::new("https://llm.example.com/v1", "k"), "qwen-plus")
            .with_max_tokens(512);
        let prompt = Prompt::new("sys", "user").with_temperature(0.2);

        let request = chat_request(&ctx, &prompt);
        assert_eq!(request.model, "qwen-plus");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].content, "sys");
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(512));
    }

    #[tokio::test]
    async fn missing_key_surfaces_as_ai_error() {
        let ctx = AiContext::new(Endpoint::new("https://llm.example.com/v1", ""), "qwen-plus");
        let err = OpenAiModel::new()
            .complete(&ctx, &Prompt::new("s", "u"))
            .await
            .unwrap_err();
        assert!(matches!(err, NewsroomError::AI(_)));
    }
}

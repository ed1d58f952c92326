//! Language model seam.
//!
//! Every call carries an immutable [`AiContext`] naming the endpoint,
//! credentials, and model. Implementations keep no per-run settings.

use async_trait::async_trait;
use openai_client::Endpoint;

use crate::error::Result;

/// Default completion budget per call.
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

/// Endpoint, credentials, and model for one run's AI calls.
#[derive(Debug, Clone)]
pub struct AiContext {
    pub endpoint: Endpoint,
    pub model: String,
    pub max_tokens: u32,
}

impl AiContext {
    pub fn new(endpoint: Endpoint, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A two-message prompt: instructions plus the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.7,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Text-in, text-out model access.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete the prompt and return the raw reply text.
    async fn complete(&self, ctx: &AiContext, prompt: &Prompt) -> Result<String>;
}
